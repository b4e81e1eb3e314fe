// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The audit trail's unit of record (§4.H). References Detections and
//! UniversalRules by id, and by embedding their immutable content at the
//! time each stage observed them — never the mutable `RuleState` — so
//! the trail never forms an object-graph cycle with live pipeline state
//! (§9 "Cyclic references").

use serde::{Deserialize, Serialize};

use crate::decision::Decision;
use crate::detection::AggregateLabel;
use crate::feature::FeatureVector;
use crate::ids::{DetectionId, RuleId};
use crate::rule::{AdapterRuleOutcome, UniversalRule};
use crate::verdict::DetectorVerdict;

/// One immutable audit entry, built up incrementally as a single flow's
/// Detection moves through C → B → A. Every field beyond the detection
/// stage is `None`/empty until that stage runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub detection_id: DetectionId,
    pub feature_vector: FeatureVector,
    pub verdicts: Vec<DetectorVerdict>,
    pub aggregate_score: f64,
    pub aggregate_label: AggregateLabel,
    pub detected_at: i64,
    pub decision: Option<Decision>,
    pub rule: Option<UniversalRule>,
    pub adapter_outcomes: Vec<AdapterRuleOutcome>,
    pub updated_at: i64,
}

impl AuditRecord {
    pub fn new(
        detection_id: DetectionId,
        feature_vector: FeatureVector,
        verdicts: Vec<DetectorVerdict>,
        aggregate_score: f64,
        aggregate_label: AggregateLabel,
        now_ms: i64,
    ) -> Self {
        Self {
            detection_id,
            feature_vector,
            verdicts,
            aggregate_score,
            aggregate_label,
            detected_at: now_ms,
            decision: None,
            rule: None,
            adapter_outcomes: Vec::new(),
            updated_at: now_ms,
        }
    }

    pub fn rule_id(&self) -> Option<RuleId> {
        self.rule.as_ref().map(|rule| rule.rule_id)
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
