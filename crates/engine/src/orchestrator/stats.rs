// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Policy-orchestrator counters (§10.4).

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct OrchestratorStats {
    pub rules_synthesized: AtomicU64,
    pub rules_rejected: AtomicU64,
    pub rules_deduped: AtomicU64,
    pub rules_superseded: AtomicU64,
    pub rules_active: AtomicU64,
    pub rules_failed: AtomicU64,
    pub rules_expired: AtomicU64,
    pub rules_rolled_back: AtomicU64,
    pub apply_retries: AtomicU64,
}

impl OrchestratorStats {
    pub fn snapshot(&self) -> OrchestratorStatsSnapshot {
        OrchestratorStatsSnapshot {
            rules_synthesized: self.rules_synthesized.load(Ordering::Relaxed),
            rules_rejected: self.rules_rejected.load(Ordering::Relaxed),
            rules_deduped: self.rules_deduped.load(Ordering::Relaxed),
            rules_superseded: self.rules_superseded.load(Ordering::Relaxed),
            rules_active: self.rules_active.load(Ordering::Relaxed),
            rules_failed: self.rules_failed.load(Ordering::Relaxed),
            rules_expired: self.rules_expired.load(Ordering::Relaxed),
            rules_rolled_back: self.rules_rolled_back.load(Ordering::Relaxed),
            apply_retries: self.apply_retries.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct OrchestratorStatsSnapshot {
    pub rules_synthesized: u64,
    pub rules_rejected: u64,
    pub rules_deduped: u64,
    pub rules_superseded: u64,
    pub rules_active: u64,
    pub rules_failed: u64,
    pub rules_expired: u64,
    pub rules_rolled_back: u64,
    pub apply_retries: u64,
}
