// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered, partitioned, at-least-once topic abstraction (§4.G). The core
//! pipeline depends only on the [`Bus`] contract; `inproc` and `nats` are
//! two interchangeable implementations of it, selected at startup by
//! config (§11 "Bus backend selection").

pub mod inproc;
pub mod nats;
pub mod stats;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{de::DeserializeOwned, Serialize};

/// Hashes a partition key the same way across backends so ordering
/// guarantees (§5: "per partition ... ordering is preserved") hold
/// regardless of which [`Bus`] implementation is in use.
pub fn partition_of(key: &str, partition_count: u32) -> u32 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % partition_count as u64) as u32
}

/// A message handed to a subscriber, carrying enough to support
/// at-least-once delivery with downstream idempotency (§4.G, §5).
#[derive(Debug, Clone)]
pub struct BusMessage<T> {
    pub partition: u32,
    pub offset: u64,
    pub payload: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The bus applied backpressure and the publish deadline elapsed
    /// (§4.F "PublishTimeout").
    Timeout,
    /// The backend is not reachable at all (distinct from a full queue).
    Unavailable,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "publish timed out"),
            Self::Unavailable => write!(f, "bus backend unavailable"),
        }
    }
}

impl std::error::Error for PublishError {}

type BusFuture<'a, O> = Pin<Box<dyn Future<Output = O> + Send + 'a>>;

/// The contract every bus backend implements. Topics are typed by the
/// generic `T`; `inproc` and `nats` are the two concrete implementations.
/// Object-safe for use as `Arc<dyn Bus<T>>`, matching the backend's
/// `Backend`/`Boxed` shape.
pub trait Bus<T>: Send + Sync
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Publish `payload` keyed by `key` (used for partition assignment).
    /// Blocks the caller under backpressure, per §4.F/§5, up to
    /// `deadline`.
    fn publish<'a>(
        &'a self,
        key: &'a str,
        payload: T,
        deadline: std::time::Duration,
    ) -> BusFuture<'a, Result<(), PublishError>>;

    /// Subscribe as part of `consumer_group`; `handler` is invoked for
    /// each message delivered to this consumer. At-least-once: handlers
    /// must be idempotent on whatever id is embedded in `T`.
    fn subscribe<'a>(
        &'a self,
        consumer_group: &'a str,
        handler: Box<dyn Fn(BusMessage<T>) + Send + Sync>,
    ) -> BusFuture<'a, Result<(), PublishError>>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
