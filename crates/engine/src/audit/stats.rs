// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct AuditStats {
    pub opened: AtomicU64,
    pub purged: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditStatsSnapshot {
    pub opened: u64,
    pub purged: u64,
}

impl AuditStats {
    pub fn record_opened(&self) {
        self.opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_purged(&self, count: u64) {
        self.purged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AuditStatsSnapshot {
        AuditStatsSnapshot { opened: self.opened.load(Ordering::Relaxed), purged: self.purged.load(Ordering::Relaxed) }
    }
}
