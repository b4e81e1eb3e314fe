// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ensemble output (§3 "Detection", §4.D).

use serde::{Deserialize, Serialize};

use crate::ids::{DetectionId, FeatureVectorId};
use crate::verdict::DetectorVerdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateLabel {
    Benign,
    Threat,
    /// Emitted when every detector failed (§4.D); downstream must treat
    /// this as "monitor only" (§7).
    Unknown,
}

/// `(detection_id, feature_vector_ref, verdicts[], aggregate_score,
/// aggregate_label, decided_at)`, immutable (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub detection_id: DetectionId,
    pub feature_vector_ref: FeatureVectorId,
    pub verdicts: Vec<DetectorVerdict>,
    /// `NaN` iff `aggregate_label == Unknown` (§4.D, §8 property 3).
    pub aggregate_score: f64,
    pub aggregate_label: AggregateLabel,
    pub decided_at: i64,
    /// Detector ids whose weight was redistributed away because they
    /// failed to produce a verdict this round.
    pub failed_detectors: Vec<String>,
}

impl Detection {
    /// §8 property 3: `aggregate_score ∈ [0,1] ∪ {NaN}`.
    pub fn score_is_well_formed(&self) -> bool {
        self.aggregate_score.is_nan() || (0.0..=1.0).contains(&self.aggregate_score)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.aggregate_label, AggregateLabel::Unknown)
    }
}
