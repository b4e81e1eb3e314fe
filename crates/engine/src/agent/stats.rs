// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Policy-agent counters (§10.4).

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct AgentStats {
    pub decisions_emitted: AtomicU64,
    pub learned_used: AtomicU64,
    pub fallback_used: AtomicU64,
    pub agent_errors: AtomicU64,
    pub cancelled: AtomicU64,
}

impl AgentStats {
    pub fn snapshot(&self) -> AgentStatsSnapshot {
        AgentStatsSnapshot {
            decisions_emitted: self.decisions_emitted.load(Ordering::Relaxed),
            learned_used: self.learned_used.load(Ordering::Relaxed),
            fallback_used: self.fallback_used.load(Ordering::Relaxed),
            agent_errors: self.agent_errors.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct AgentStatsSnapshot {
    pub decisions_emitted: u64,
    pub learned_used: u64,
    pub fallback_used: u64,
    pub agent_errors: u64,
    pub cancelled: u64,
}
