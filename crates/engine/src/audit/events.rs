// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the orchestrator's failure-path hooks into the audit trail and
//! the alerter: a rejected or permanently-failed rule is exactly the
//! subset of §7's error table rows that the orchestrator can observe on
//! its own, without the pipeline's C→B→A context in hand.

use std::sync::Arc;

use netdefend_core::error::ValidationError;
use netdefend_core::ids::RuleId;
use netdefend_core::rule::{AdapterRuleOutcome, UniversalRule};

use crate::alerting::Alerter;
use crate::orchestrator::OrchestratorEvents;

use super::trail::AuditTrail;

pub struct AuditOrchestratorEvents {
    trail: Arc<AuditTrail>,
    alerter: Arc<Alerter>,
}

impl AuditOrchestratorEvents {
    pub fn new(trail: Arc<AuditTrail>, alerter: Arc<Alerter>) -> Self {
        Self { trail, alerter }
    }
}

impl OrchestratorEvents for AuditOrchestratorEvents {
    /// §7 `ValidationError` row: "reject, audit, alert". The rule never
    /// made it into the store, so there's no detection_id to append to —
    /// this is recorded purely as an alert, keyed off the decision that
    /// produced the rejected rule.
    fn rule_rejected(&self, rule: &UniversalRule, err: &ValidationError) {
        tracing::warn!(rule_id = %rule.rule_id, reason = %err, "rule rejected by validation");
        self.alerter.notify(
            &rejection_decision_stub(rule),
            Some(rule),
            crate::clock::now_ms(),
        );
    }

    /// §7 `AdapterPermanent` row: "give up, audit, alert". The audit
    /// record was opened by the pipeline when the Detection first came
    /// through; this hook fills in the final adapter outcomes via the
    /// rule-id index and raises the alert.
    fn rule_permanently_failed(&self, rule: &UniversalRule, outcomes: &[AdapterRuleOutcome]) {
        tracing::warn!(rule_id = %rule.rule_id, "rule permanently failed to apply");
        let now = crate::clock::now_ms();
        if let Some(record) = self.trail.get_by_rule(rule.rule_id) {
            self.trail.attach_adapter_outcomes(record.detection_id, outcomes.to_vec(), now);
        }
        self.alerter.notify(&rejection_decision_stub(rule), Some(rule), now);
    }

    /// A rule reached `active`: no alert (this is the success path), but
    /// the audit record still wants the final per-adapter outcomes.
    fn rule_active(&self, rule: &UniversalRule, outcomes: &[AdapterRuleOutcome]) {
        if let Some(record) = self.trail.get_by_rule(rule.rule_id) {
            self.trail.attach_adapter_outcomes(record.detection_id, outcomes.to_vec(), crate::clock::now_ms());
        }
    }

    fn rule_rolled_back(&self, rule_id: RuleId) {
        tracing::info!(rule_id = %rule_id, "rule rolled back");
        if let Some(record) = self.trail.get_by_rule(rule_id) {
            self.trail.attach_adapter_outcomes(record.detection_id, record.adapter_outcomes.clone(), crate::clock::now_ms());
        }
    }
}

/// The alerter keys and labels off a `Decision`; the orchestrator only
/// has the synthesized `UniversalRule` at hand for these two hooks, so
/// this rebuilds the minimal `Decision` shell the rule itself already
/// carries a reference to (`origin_decision_ref`). `RuleAction` doesn't
/// retain the exact rate-limit tier or quarantine duration that produced
/// it, so those collapse to a representative variant — good enough for
/// severity derivation and the alert summary, which is all this is for.
fn rejection_decision_stub(rule: &UniversalRule) -> netdefend_core::decision::Decision {
    use netdefend_core::decision::{Action, QuarantineDuration, RateLimitTier};
    use netdefend_core::rule::RuleAction;

    let action = match rule.action {
        RuleAction::Allow => Action::Allow,
        RuleAction::Deny => Action::Deny,
        RuleAction::RateLimit { .. } => Action::RateLimit(RateLimitTier::Med),
        RuleAction::Quarantine { .. } => Action::Quarantine(QuarantineDuration::Short),
        RuleAction::Monitor => Action::Monitor,
    };

    netdefend_core::decision::Decision {
        decision_id: rule.origin_decision_ref,
        detection_ref: netdefend_core::ids::DetectionId::new(),
        action,
        parameters: netdefend_core::decision::ActionParameters::default(),
        confidence: 1.0,
        agent_id: "orchestrator".to_string(),
        decided_at: rule.created_at,
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
