// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::net::{IpAddr, Ipv4Addr};

use netdefend_core::ids::{DecisionId, RuleId};
use netdefend_core::rule::RuleMatch;

use super::*;

fn ip(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(a, b, c, d))
}

fn rule_with(action: RuleAction, src: IpAddr, prefix_len: u8) -> UniversalRule {
    UniversalRule {
        rule_id: RuleId::new(),
        rule_match: RuleMatch { src_cidr: Some(Cidr { addr: src, prefix_len }), ..Default::default() },
        action,
        priority: 10,
        ttl_ms: None,
        origin_decision_ref: DecisionId::new(),
        created_at: 0,
    }
}

#[test]
fn rejects_a_rule_targeting_a_protected_asset() {
    let protected = [Cidr { addr: ip(10, 0, 0, 1), prefix_len: 32 }];
    let rule = rule_with(RuleAction::Deny, ip(10, 0, 0, 1), 32);

    let result = validate(&rule, &protected, &HashMap::new(), &[]);
    assert!(matches!(result, Err(ValidationError::ProtectedAsset { .. })));
}

#[test]
fn rejects_a_rule_broader_than_the_configured_max_scope() {
    let mut max_scope = HashMap::new();
    max_scope.insert("deny".to_string(), 24);
    let rule = rule_with(RuleAction::Deny, ip(10, 0, 0, 0), 8);

    let result = validate(&rule, &[], &max_scope, &[]);
    assert!(matches!(result, Err(ValidationError::ScopeTooBroad { max_bits: 24, requested_bits: 8 })));
}

#[test]
fn rejects_a_deny_that_contradicts_a_pinned_allow_entry() {
    let allow_entry = rule_with(RuleAction::Allow, ip(10, 0, 0, 5), 32);
    let rule = rule_with(RuleAction::Deny, ip(10, 0, 0, 5), 32);

    let result = validate(&rule, &[], &HashMap::new(), std::slice::from_ref(&allow_entry));
    assert!(matches!(result, Err(ValidationError::ContradictsAllowList { .. })));
}

#[test]
fn accepts_a_rule_with_no_violations() {
    let rule = rule_with(RuleAction::Monitor, ip(192, 168, 1, 1), 32);
    assert!(validate(&rule, &[], &HashMap::new(), &[]).is_ok());
}
