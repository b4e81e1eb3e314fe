// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct AlertStats {
    pub published: AtomicU64,
    pub deduped: AtomicU64,
    pub sink_failures: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertStatsSnapshot {
    pub published: u64,
    pub deduped: u64,
    pub sink_failures: u64,
}

impl AlertStats {
    pub fn snapshot(&self) -> AlertStatsSnapshot {
        AlertStatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            deduped: self.deduped.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}
