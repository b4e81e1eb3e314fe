// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Feature-engine counters (§4.E edge cases, §10.4).

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct FeatureStats {
    pub late_dropped: AtomicU64,
    pub windows_evicted: AtomicU64,
    pub windows_emitted: AtomicU64,
    /// A record's shard-routing channel was full and the record was
    /// dropped rather than blocking the bus subscriber.
    pub shard_channel_dropped: AtomicU64,
}

impl FeatureStats {
    pub fn snapshot(&self) -> FeatureStatsSnapshot {
        FeatureStatsSnapshot {
            late_dropped: self.late_dropped.load(Ordering::Relaxed),
            windows_evicted: self.windows_evicted.load(Ordering::Relaxed),
            windows_emitted: self.windows_emitted.load(Ordering::Relaxed),
            shard_channel_dropped: self.shard_channel_dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct FeatureStatsSnapshot {
    pub late_dropped: u64,
    pub windows_evicted: u64,
    pub windows_emitted: u64,
    pub shard_channel_dropped: u64,
}
