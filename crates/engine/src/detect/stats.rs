// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detection-ensemble counters (§10.4).

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct DetectionStats {
    pub detections_emitted: AtomicU64,
    pub threat_count: AtomicU64,
    pub benign_count: AtomicU64,
    pub unknown_count: AtomicU64,
    pub detector_failures: AtomicU64,
}

impl DetectionStats {
    pub fn snapshot(&self) -> DetectionStatsSnapshot {
        DetectionStatsSnapshot {
            detections_emitted: self.detections_emitted.load(Ordering::Relaxed),
            threat_count: self.threat_count.load(Ordering::Relaxed),
            benign_count: self.benign_count.load(Ordering::Relaxed),
            unknown_count: self.unknown_count.load(Ordering::Relaxed),
            detector_failures: self.detector_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DetectionStatsSnapshot {
    pub detections_emitted: u64,
    pub threat_count: u64,
    pub benign_count: u64,
    pub unknown_count: u64,
    pub detector_failures: u64,
}
