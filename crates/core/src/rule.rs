// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Vendor-neutral enforcement record and its lifecycle state (§3
//! "UniversalRule", "RuleState", §4.B).

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::decision::{Action, RateLimitTier};
use crate::ids::{DecisionId, RuleId};
use crate::record::Protocol;

/// A CIDR block, stored as `(network address, prefix length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cidr {
    pub addr: IpAddr,
    pub prefix_len: u8,
}

impl Cidr {
    pub fn host(addr: IpAddr) -> Self {
        let prefix_len = if addr.is_ipv4() { 32 } else { 128 };
        Self { addr, prefix_len }
    }

    pub fn contains(&self, other: IpAddr) -> bool {
        match (self.addr, other) {
            (IpAddr::V4(net), IpAddr::V4(o)) => {
                let mask = if self.prefix_len == 0 { 0 } else { u32::MAX << (32 - self.prefix_len) };
                (u32::from(net) & mask) == (u32::from(o) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(o)) => {
                let mask = if self.prefix_len == 0 { 0 } else { u128::MAX << (128 - self.prefix_len) };
                (u128::from(net) & mask) == (u128::from(o) & mask)
            }
            _ => false,
        }
    }
}

/// The match criteria of a `UniversalRule`. `None` on a field means
/// "any".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub src_cidr: Option<Cidr>,
    pub dst_cidr: Option<Cidr>,
    pub protocol: Option<Protocol>,
    pub dst_ports: Option<(u16, u16)>,
    pub src_ports: Option<(u16, u16)>,
}

impl RuleMatch {
    /// Whether two matches could both apply to the same packet — used by
    /// conflict detection (§4.B), which treats any non-disjoint overlap
    /// as a candidate conflict even when not identical.
    pub fn intersects(&self, other: &Self) -> bool {
        fn cidrs_intersect(a: Option<Cidr>, b: Option<Cidr>) -> bool {
            match (a, b) {
                (None, _) | (_, None) => true,
                (Some(a), Some(b)) => a.contains(b.addr) || b.contains(a.addr),
            }
        }
        fn ports_intersect(a: Option<(u16, u16)>, b: Option<(u16, u16)>) -> bool {
            match (a, b) {
                (None, _) | (_, None) => true,
                (Some((a0, a1)), Some((b0, b1))) => a0 <= b1 && b0 <= a1,
            }
        }
        cidrs_intersect(self.src_cidr, other.src_cidr)
            && cidrs_intersect(self.dst_cidr, other.dst_cidr)
            && ports_intersect(self.dst_ports, other.dst_ports)
            && ports_intersect(self.src_ports, other.src_ports)
            && match (self.protocol, other.protocol) {
                (None, _) | (_, None) => true,
                (Some(a), Some(b)) => a == b,
            }
    }
}

/// The action-family half of a `UniversalRule`. Carries the same
/// parameters as `Action` but is the orchestrator's own copy, decoupled
/// from the `Decision` that originated it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RuleAction {
    Allow,
    Deny,
    RateLimit { pps: u32 },
    Quarantine { ttl_ms: i64 },
    Monitor,
}

impl RuleAction {
    pub fn family(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::RateLimit { .. } => "rate_limit",
            Self::Quarantine { .. } => "quarantine",
            Self::Monitor => "monitor",
        }
    }

    pub fn from_action(action: Action, rate_limit_pps: u32, quarantine_ttl_ms: i64) -> Self {
        match action {
            Action::Allow => Self::Allow,
            Action::Deny => Self::Deny,
            Action::RateLimit(tier) => {
                let pps = match tier {
                    RateLimitTier::Low => rate_limit_pps / 4,
                    RateLimitTier::Med => rate_limit_pps / 2,
                    RateLimitTier::High => rate_limit_pps,
                };
                Self::RateLimit { pps: pps.max(1) }
            }
            Action::Quarantine(_) => Self::Quarantine { ttl_ms: quarantine_ttl_ms },
            Action::Monitor => Self::Monitor,
        }
    }
}

/// `(rule_id, match, action, priority, ttl?, origin_decision_ref)`,
/// immutable after acceptance (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniversalRule {
    pub rule_id: RuleId,
    pub rule_match: RuleMatch,
    pub action: RuleAction,
    pub priority: u16,
    pub ttl_ms: Option<i64>,
    pub origin_decision_ref: DecisionId,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleLifecycle {
    Pending,
    Applying,
    Active,
    Failed,
    Expired,
    RolledBack,
}

/// Per-adapter apply/remove outcome, tracked separately from the rule
/// itself (§3 "RuleState").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterRuleOutcome {
    pub adapter_id: String,
    pub outcome: crate::error::AdapterOutcome,
    pub per_rule_id: Option<String>,
    pub attempts: u32,
    pub last_attempt_at: i64,
}

/// Per-`rule_id` mutable state, owned and mutated only by the
/// orchestrator (§3, §5 "single-writer-per-rule").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleState {
    pub rule_id: RuleId,
    pub lifecycle: RuleLifecycle,
    pub adapter_outcomes: Vec<AdapterRuleOutcome>,
    pub hit_count: u64,
    pub created_at: i64,
    pub updated_at: i64,
    pub retry_attempts: u32,
}

impl RuleState {
    pub fn new(rule_id: RuleId, now_ms: i64) -> Self {
        Self {
            rule_id,
            lifecycle: RuleLifecycle::Pending,
            adapter_outcomes: Vec::new(),
            hit_count: 0,
            created_at: now_ms,
            updated_at: now_ms,
            retry_attempts: 0,
        }
    }

    /// §3 invariant: hit counters are monotonically non-decreasing
    /// between adapter polls.
    pub fn record_hits(&mut self, hits: u64, now_ms: i64) {
        self.hit_count = self.hit_count.max(hits);
        self.updated_at = now_ms;
    }

    pub fn all_adapters_failed(&self) -> bool {
        !self.adapter_outcomes.is_empty()
            && self
                .adapter_outcomes
                .iter()
                .all(|o| !matches!(o.outcome, crate::error::AdapterOutcome::Ok))
    }

    pub fn any_adapter_ok(&self) -> bool {
        self.adapter_outcomes.iter().any(|o| matches!(o.outcome, crate::error::AdapterOutcome::Ok))
    }
}

#[cfg(test)]
#[path = "rule_tests.rs"]
mod tests;
