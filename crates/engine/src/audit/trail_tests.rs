// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::net::{IpAddr, Ipv4Addr};

use netdefend_core::decision::{Action, ActionParameters};
use netdefend_core::feature::{FeatureContext, FEATURE_SLOTS};
use netdefend_core::ids::{DecisionId, FeatureVectorId};
use netdefend_core::rule::{Cidr, RuleAction, RuleMatch};
use netdefend_core::window::WindowKey;

use super::*;

fn feature_vector() -> FeatureVector {
    FeatureVector {
        id: FeatureVectorId::new(),
        version: 1,
        slots: vec![0.0; FEATURE_SLOTS.len()],
        context: FeatureContext { window_key: WindowKey("10.0.0.1".into()), window_start_ms: 0, window_end_ms: 1 },
    }
}

fn rule(decision_id: DecisionId) -> UniversalRule {
    UniversalRule {
        rule_id: RuleId::new(),
        rule_match: RuleMatch { src_cidr: Some(Cidr::host(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)))), ..Default::default() },
        action: RuleAction::Deny,
        priority: 10,
        ttl_ms: None,
        origin_decision_ref: decision_id,
        created_at: 0,
    }
}

#[test]
fn a_fresh_detection_is_retrievable_and_has_no_rule_yet() {
    let trail = AuditTrail::new();
    let detection_id = DetectionId::new();
    trail.record_detection(detection_id, feature_vector(), Vec::new(), 0.5, AggregateLabel::Threat, 0);

    let record = trail.get_by_detection(detection_id).expect("record");
    assert!(record.rule.is_none());
    assert_eq!(trail.stats().snapshot().opened, 1);
}

#[test]
fn attaching_a_rule_makes_it_findable_by_rule_id() {
    let trail = AuditTrail::new();
    let detection_id = DetectionId::new();
    trail.record_detection(detection_id, feature_vector(), Vec::new(), 0.9, AggregateLabel::Threat, 0);

    let decision = Decision {
        decision_id: DecisionId::new(),
        detection_ref: detection_id,
        action: Action::Deny,
        parameters: ActionParameters::default(),
        confidence: 0.9,
        agent_id: "agent-1".to_string(),
        decided_at: 1,
    };
    let rule = rule(decision.decision_id);
    let rule_id = rule.rule_id;

    trail.attach_decision(detection_id, decision, 1);
    trail.attach_rule(detection_id, rule, 1);

    let by_rule = trail.get_by_rule(rule_id).expect("record by rule");
    assert_eq!(by_rule.detection_id, detection_id);
    assert!(by_rule.decision.is_some());
}

#[test]
fn attaching_outcomes_to_an_unknown_detection_is_a_no_op() {
    let trail = AuditTrail::new();
    trail.attach_decision(DetectionId::new(), Decision {
        decision_id: DecisionId::new(),
        detection_ref: DetectionId::new(),
        action: Action::Monitor,
        parameters: ActionParameters::default(),
        confidence: 0.1,
        agent_id: "agent-1".to_string(),
        decided_at: 0,
    }, 0);
    assert_eq!(trail.stats().snapshot().opened, 0);
}

#[test]
fn purge_expired_drops_records_past_retention_and_their_rule_index() {
    let trail = AuditTrail::new();
    let detection_id = DetectionId::new();
    trail.record_detection(detection_id, feature_vector(), Vec::new(), 0.9, AggregateLabel::Threat, 0);
    let decision_id = DecisionId::new();
    trail.attach_rule(detection_id, rule(decision_id), 0);

    let purged = trail.purge_expired(10_000, 5_000);
    assert_eq!(purged, 1);
    assert!(trail.get_by_detection(detection_id).is_none());
    assert_eq!(trail.stats().snapshot().purged, 1);
}

#[test]
fn purge_expired_keeps_records_inside_the_retention_horizon() {
    let trail = AuditTrail::new();
    let detection_id = DetectionId::new();
    trail.record_detection(detection_id, feature_vector(), Vec::new(), 0.2, AggregateLabel::Benign, 9_000);

    let purged = trail.purge_expired(10_000, 5_000);
    assert_eq!(purged, 0);
    assert!(trail.get_by_detection(detection_id).is_some());
}
