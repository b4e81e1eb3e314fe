// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-adapter apply/remove counters, surfaced on the stats HTTP surface.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct AdapterStats {
    pub applies_ok: AtomicU64,
    pub applies_transient: AtomicU64,
    pub applies_permanent: AtomicU64,
    pub applies_unreachable: AtomicU64,
    pub removes: AtomicU64,
    pub pauses: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdapterStatsSnapshot {
    pub applies_ok: u64,
    pub applies_transient: u64,
    pub applies_permanent: u64,
    pub applies_unreachable: u64,
    pub removes: u64,
    pub pauses: u64,
}

impl AdapterStats {
    pub fn snapshot(&self) -> AdapterStatsSnapshot {
        AdapterStatsSnapshot {
            applies_ok: self.applies_ok.load(Ordering::Relaxed),
            applies_transient: self.applies_transient.load(Ordering::Relaxed),
            applies_permanent: self.applies_permanent.load(Ordering::Relaxed),
            applies_unreachable: self.applies_unreachable.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            pauses: self.pauses.load(Ordering::Relaxed),
        }
    }
}
