// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One detector's opinion on a feature vector (§3 "DetectorVerdict").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictLabel {
    Benign,
    Threat,
}

/// Optional per-feature attribution a detector may supply, retained for
/// the audit trail (§4.H).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub feature_name: String,
    pub weight: f64,
}

/// `(detector_id, score, label, confidence, contributions?)`, immutable
/// once produced (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorVerdict {
    pub detector_id: String,
    pub score: f64,
    pub label: VerdictLabel,
    pub confidence: f64,
    pub contributions: Vec<Contribution>,
}

impl DetectorVerdict {
    /// `score` and `confidence` are each required to lie in `[0,1]` (§8
    /// property 3's premise, specialized to a single verdict).
    pub fn is_well_formed(&self) -> bool {
        (0.0..=1.0).contains(&self.score) && (0.0..=1.0).contains(&self.confidence)
    }
}
