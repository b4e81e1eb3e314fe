// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps a Decision to a `UniversalRule` (§4.B "Rule synthesis").

use std::hash::{Hash, Hasher};

use netdefend_core::config::EngineConfig;
use netdefend_core::decision::{Action, Decision};
use netdefend_core::ids::RuleId;
use netdefend_core::rule::{Cidr, RuleAction, RuleMatch, UniversalRule};
use netdefend_core::window::WindowKey;

/// Context carried alongside a `Decision` that rule synthesis needs but
/// `Decision` itself doesn't carry: the originating flow identity. This
/// is the `WindowKey` of the feature vector the Detection was scored
/// from — the only flow identity the pipeline retains past the feature
/// engine (B).
#[derive(Debug, Clone)]
pub struct RuleOrigin {
    pub window_key: WindowKey,
}

/// Small deterministic tie-breaker so same-action rules synthesized in
/// the same tick don't all land on the exact same priority (§4.B
/// "priority = base_priority[action] + age_jitter").
fn age_jitter(rule_id: RuleId) -> u16 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    rule_id.0.hash(&mut hasher);
    (hasher.finish() % 16) as u16
}

/// Builds a `UniversalRule` for `decision`. The match narrows to the
/// source address for `deny`/`quarantine` (§4.B: "deny narrows to source
/// address"; "quarantine expands to the whole host", i.e. drops any
/// port/protocol specificity rather than widening the address itself);
/// `rate_limit` additionally pins the destination port when the
/// originating window key carried one, and always carries the
/// per-second cap.
pub fn synthesize(decision: &Decision, origin: &RuleOrigin, config: &EngineConfig, now_ms: i64) -> UniversalRule {
    let rule_id = RuleId::new();
    let src_cidr = origin.window_key.parse_src_addr().map(Cidr::host);

    let rule_match = match decision.action {
        Action::RateLimit(_) => {
            RuleMatch { src_cidr, dst_ports: origin.window_key.parse_dst_port().map(|p| (p, p)), ..Default::default() }
        }
        _ => RuleMatch { src_cidr, ..Default::default() },
    };

    let pps = decision.parameters.rate_limit_pps.unwrap_or(config.orchestrator.default_rate_limit_pps);
    let ttl_ms = config.ttl_for_action(decision.action);
    let action = RuleAction::from_action(decision.action, pps, ttl_ms.unwrap_or(0));

    let base_priority =
        config.orchestrator.action_base_priority.get(decision.action.family()).copied().unwrap_or(u16::MAX);
    let priority = base_priority.saturating_add(age_jitter(rule_id));

    UniversalRule {
        rule_id,
        rule_match,
        action,
        priority,
        ttl_ms,
        origin_decision_ref: decision.decision_id,
        created_at: now_ms,
    }
}

#[cfg(test)]
#[path = "synth_tests.rs"]
mod tests;
