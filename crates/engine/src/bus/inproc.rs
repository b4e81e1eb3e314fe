// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Default in-process backend: a fixed set of partitions, each an
//! independent `tokio::sync::broadcast` channel. Messages are keyed into
//! partitions by [`super::partition_of`] so ordering is preserved within
//! a partition while different partitions progress concurrently (§5).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{select_all, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use super::stats::BusStats;
use super::{partition_of, Bus, BusFuture, BusMessage, PublishError};

/// How often a full partition is re-checked while a publish is blocked
/// on backpressure.
const POLL_INTERVAL: Duration = Duration::from_millis(2);

struct Partition<T> {
    tx: broadcast::Sender<BusMessage<T>>,
    next_offset: AtomicU64,
    capacity: usize,
}

/// In-process bus. Cheap to construct, no external process required;
/// this is the default backend used when `--bus inproc` (or no `--bus`
/// flag) is given.
pub struct InprocBus<T> {
    partitions: Vec<Arc<Partition<T>>>,
    stats: Arc<BusStats>,
}

impl<T> InprocBus<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(partition_count: u32, capacity: usize) -> Self {
        let partitions = (0..partition_count.max(1))
            .map(|_| {
                let (tx, _rx) = broadcast::channel(capacity);
                Arc::new(Partition { tx, next_offset: AtomicU64::new(0), capacity })
            })
            .collect();
        Self { partitions, stats: Arc::new(BusStats::default()) }
    }

    pub fn stats(&self) -> Arc<BusStats> {
        Arc::clone(&self.stats)
    }
}

impl<T> Bus<T> for InprocBus<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn publish<'a>(
        &'a self,
        key: &'a str,
        payload: T,
        deadline: Duration,
    ) -> BusFuture<'a, Result<(), PublishError>> {
        Box::pin(async move {
            let idx = partition_of(key, self.partitions.len() as u32) as usize;
            let partition = &self.partitions[idx];

            // `broadcast` has no native bounded-send: a slow consumer
            // only ever lags, it never blocks the producer. Emulate the
            // "producer blocks on a full channel" contract (§5) by
            // polling the queue depth against its configured capacity
            // until either it drains or `deadline` elapses.
            let start = tokio::time::Instant::now();
            while partition.tx.len() >= partition.capacity {
                if start.elapsed() >= deadline {
                    self.stats.publish_timeouts.fetch_add(1, Ordering::Relaxed);
                    return Err(PublishError::Timeout);
                }
                tokio::time::sleep(POLL_INTERVAL.min(deadline)).await;
            }

            let offset = partition.next_offset.fetch_add(1, Ordering::SeqCst);
            let message = BusMessage { partition: idx as u32, offset, payload };
            // No subscribers is not an error: at-least-once delivery only
            // binds consumers that are actually listening.
            let _ = partition.tx.send(message);
            Ok(())
        })
    }

    fn subscribe<'a>(
        &'a self,
        consumer_group: &'a str,
        handler: Box<dyn Fn(BusMessage<T>) + Send + Sync>,
    ) -> BusFuture<'a, Result<(), PublishError>> {
        Box::pin(async move {
            let streams = self
                .partitions
                .iter()
                .map(|p| BroadcastStream::new(p.tx.subscribe()));
            let mut merged = select_all(streams);
            debug!(consumer_group, partitions = self.partitions.len(), "inproc subscriber attached");

            while let Some(item) = merged.next().await {
                match item {
                    Ok(message) => handler(message),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        self.stats.subscriber_lagged.fetch_add(1, Ordering::Relaxed);
                        warn!(consumer_group, skipped = n, "inproc subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => continue,
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "inproc_tests.rs"]
mod tests;
