// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rejects candidate rules before they're ever applied (§4.B
//! "Validation").

use std::collections::HashMap;

use netdefend_core::error::ValidationError;
use netdefend_core::rule::{Cidr, RuleAction, UniversalRule};

/// Checked in order: protected asset, scope too broad, then contradicts
/// a pinned allow-list entry. The first violation wins.
pub fn validate(
    rule: &UniversalRule,
    protected_assets: &[Cidr],
    max_scope_prefix_len: &HashMap<String, u8>,
    allow_list: &[UniversalRule],
) -> Result<(), ValidationError> {
    if let Some(asset) = targets_protected_asset(rule, protected_assets) {
        return Err(ValidationError::ProtectedAsset { asset: format!("{}/{}", asset.addr, asset.prefix_len) });
    }

    if let Some(requested_bits) = rule.rule_match.src_cidr.map(|c| c.prefix_len) {
        if let Some(&max_bits) = max_scope_prefix_len.get(rule.action.family()) {
            if requested_bits < max_bits {
                return Err(ValidationError::ScopeTooBroad { max_bits, requested_bits });
            }
        }
    }

    if matches!(rule.action, RuleAction::Deny | RuleAction::Quarantine { .. }) {
        if let Some(pinned) = allow_list
            .iter()
            .find(|entry| matches!(entry.action, RuleAction::Allow) && entry.rule_match.intersects(&rule.rule_match))
        {
            return Err(ValidationError::ContradictsAllowList { rule_id_hint: pinned.rule_id.to_string() });
        }
    }

    Ok(())
}

fn targets_protected_asset(rule: &UniversalRule, protected_assets: &[Cidr]) -> Option<Cidr> {
    let candidates = [rule.rule_match.src_cidr, rule.rule_match.dst_cidr];
    candidates
        .into_iter()
        .flatten()
        .find(|cidr| protected_assets.iter().any(|asset| asset.contains(cidr.addr) || cidr.contains(asset.addr)))
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
