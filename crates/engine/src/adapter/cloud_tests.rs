// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::net::{IpAddr, Ipv4Addr};

use netdefend_core::ids::DecisionId;
use netdefend_core::rule::{Cidr, RuleMatch};

use super::*;

fn rule_with_ports(dst_ports: Option<(u16, u16)>) -> UniversalRule {
    UniversalRule {
        rule_id: RuleId::new(),
        rule_match: RuleMatch {
            src_cidr: Some(Cidr::host(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 12)))),
            dst_ports,
            ..Default::default()
        },
        action: RuleAction::RateLimit { pps: 500 },
        priority: 100,
        ttl_ms: None,
        origin_decision_ref: DecisionId::new(),
        created_at: 0,
    }
}

#[test]
fn a_single_port_never_splits() {
    let rule = rule_with_ports(Some((22, 22)));
    assert_eq!(CloudSecurityGroupAdapter::port_segments(&rule), vec![Some((22, 22))]);
}

#[test]
fn a_port_range_splits_one_port_per_segment() {
    let rule = rule_with_ports(Some((8000, 8003)));
    let segments = CloudSecurityGroupAdapter::port_segments(&rule);
    assert_eq!(segments, vec![Some((8000, 8000)), Some((8001, 8001)), Some((8002, 8002)), Some((8003, 8003))]);
}

#[test]
fn no_port_match_yields_a_single_unported_segment() {
    let rule = rule_with_ports(None);
    assert_eq!(CloudSecurityGroupAdapter::port_segments(&rule), vec![None]);
}

#[test]
fn worst_outcome_prefers_unreachable_over_everything_else() {
    let outcomes = [AdapterOutcome::Ok, AdapterOutcome::Transient, AdapterOutcome::Unreachable];
    assert_eq!(CloudSecurityGroupAdapter::worst(&outcomes), AdapterOutcome::Unreachable);
}

#[test]
fn worst_outcome_is_ok_only_when_every_segment_succeeded() {
    let outcomes = [AdapterOutcome::Ok, AdapterOutcome::Ok];
    assert_eq!(CloudSecurityGroupAdapter::worst(&outcomes), AdapterOutcome::Ok);
}

#[test]
fn pause_and_resume_toggle_is_paused() {
    let adapter = CloudSecurityGroupAdapter::new("cloud-1", "https://sg.example.invalid", None);
    assert!(!adapter.is_paused());
    adapter.pause();
    assert!(adapter.is_paused());
    adapter.resume();
    assert!(!adapter.is_paused());
}

#[test]
fn rule_payload_carries_the_origin_rule_id_and_action_family() {
    let rule = rule_with_ports(Some((22, 22)));
    let payload = CloudSecurityGroupAdapter::rule_payload(&rule, Some((22, 22)));
    assert_eq!(payload["action"], "rate_limit");
    assert_eq!(payload["origin_rule_id"], rule.rule_id.to_string());
    assert_eq!(payload["port"], 22);
}
