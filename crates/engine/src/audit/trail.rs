// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The audit trail itself: every Decision gets one [`AuditRecord`],
//! appended to as its Detection moves through the policy agent, the
//! orchestrator and the adapters (§4.H). Retained for at least the
//! configured horizon; `purge_expired` drops anything older in batches.

use std::collections::HashMap;
use std::time::Duration;

use netdefend_core::audit::AuditRecord;
use netdefend_core::decision::Decision;
use netdefend_core::detection::AggregateLabel;
use netdefend_core::feature::FeatureVector;
use netdefend_core::ids::{DetectionId, RuleId};
use netdefend_core::rule::{AdapterRuleOutcome, UniversalRule};
use netdefend_core::verdict::DetectorVerdict;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use super::stats::AuditStats;

#[derive(Default)]
pub struct AuditTrail {
    records: RwLock<HashMap<DetectionId, AuditRecord>>,
    by_rule: RwLock<HashMap<RuleId, DetectionId>>,
    stats: AuditStats,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &AuditStats {
        &self.stats
    }

    /// Opens a record for a freshly-emitted Detection (§4.H: "FeatureVector,
    /// per-detector verdicts and contributions, aggregate score/label").
    pub fn record_detection(
        &self,
        detection_id: DetectionId,
        feature_vector: FeatureVector,
        verdicts: Vec<DetectorVerdict>,
        aggregate_score: f64,
        aggregate_label: AggregateLabel,
        now_ms: i64,
    ) {
        let record = AuditRecord::new(detection_id, feature_vector, verdicts, aggregate_score, aggregate_label, now_ms);
        self.records.write().insert(detection_id, record);
        self.stats.record_opened();
    }

    pub fn attach_decision(&self, detection_id: DetectionId, decision: Decision, now_ms: i64) {
        if let Some(record) = self.records.write().get_mut(&detection_id) {
            record.decision = Some(decision);
            record.updated_at = now_ms;
        }
    }

    pub fn attach_rule(&self, detection_id: DetectionId, rule: UniversalRule, now_ms: i64) {
        let rule_id = rule.rule_id;
        if let Some(record) = self.records.write().get_mut(&detection_id) {
            record.rule = Some(rule);
            record.updated_at = now_ms;
            self.by_rule.write().insert(rule_id, detection_id);
        }
    }

    pub fn attach_adapter_outcomes(&self, detection_id: DetectionId, outcomes: Vec<AdapterRuleOutcome>, now_ms: i64) {
        if let Some(record) = self.records.write().get_mut(&detection_id) {
            record.adapter_outcomes = outcomes;
            record.updated_at = now_ms;
        }
    }

    pub fn get_by_detection(&self, detection_id: DetectionId) -> Option<AuditRecord> {
        self.records.read().get(&detection_id).cloned()
    }

    pub fn get_by_rule(&self, rule_id: RuleId) -> Option<AuditRecord> {
        let detection_id = *self.by_rule.read().get(&rule_id)?;
        self.get_by_detection(detection_id)
    }

    /// Drops every record whose `detected_at` is older than
    /// `retention_ms`, returning how many were purged (§4.H "purged in
    /// batches").
    pub fn purge_expired(&self, now_ms: i64, retention_ms: i64) -> usize {
        let expired: Vec<DetectionId> = self
            .records
            .read()
            .iter()
            .filter(|(_, record)| now_ms.saturating_sub(record.detected_at) >= retention_ms)
            .map(|(id, _)| *id)
            .collect();

        let mut records = self.records.write();
        let mut by_rule = self.by_rule.write();
        for detection_id in &expired {
            if let Some(record) = records.remove(detection_id) {
                if let Some(rule_id) = record.rule_id() {
                    by_rule.remove(&rule_id);
                }
            }
        }
        self.stats.record_purged(expired.len() as u64);
        expired.len()
    }

    /// Background purge sweep, mirroring the orchestrator's expiry loop
    /// and the alerter's prune loop (§4.H "purged in batches").
    pub async fn run_purge_loop(self: std::sync::Arc<Self>, retention_ms: i64, shutdown: CancellationToken, scan_interval: Duration) {
        let mut tick = tokio::time::interval(scan_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tick.tick() => {}
            }
            self.purge_expired(crate::clock::now_ms(), retention_ms);
        }
    }
}

#[cfg(test)]
#[path = "trail_tests.rs"]
mod tests;
