// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest-stage counters exposed via `/api/v1/stats` (§10.4).

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct IngestStats {
    pub accepted: AtomicU64,
    pub parse_errors: AtomicU64,
    pub duplicates_dropped: AtomicU64,
    pub publish_timeouts: AtomicU64,
    pub published: AtomicU64,
}

impl IngestStats {
    pub fn snapshot(&self) -> IngestStatsSnapshot {
        IngestStatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            duplicates_dropped: self.duplicates_dropped.load(Ordering::Relaxed),
            publish_timeouts: self.publish_timeouts.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct IngestStatsSnapshot {
    pub accepted: u64,
    pub parse_errors: u64,
    pub duplicates_dropped: u64,
    pub publish_timeouts: u64,
    pub published: u64,
}
