// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus-level counters (§10.4): backpressure and slow-consumer signals
//! that are otherwise only visible as a `warn!` log line.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct BusStats {
    /// A `publish` call's deadline elapsed while a partition was full.
    pub publish_timeouts: AtomicU64,
    /// A subscriber fell behind and skipped buffered messages
    /// (`RecvError::Lagged`).
    pub subscriber_lagged: AtomicU64,
}

impl BusStats {
    pub fn snapshot(&self) -> BusStatsSnapshot {
        BusStatsSnapshot {
            publish_timeouts: self.publish_timeouts.load(Ordering::Relaxed),
            subscriber_lagged: self.subscriber_lagged.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BusStatsSnapshot {
    pub publish_timeouts: u64,
    pub subscriber_lagged: u64,
}
