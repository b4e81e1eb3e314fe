// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The contract the orchestrator dispatches `UniversalRule`s through
//! (§4.A, §4.B "Apply"). Concrete adapters (a local packet filter, a
//! cloud security-group API) implement this trait; the orchestrator only
//! ever depends on it.

use std::future::Future;
use std::pin::Pin;

use netdefend_core::error::AdapterOutcome;
use netdefend_core::ids::RuleId;
use netdefend_core::rule::UniversalRule;

type AdapterFuture<'a, O> = Pin<Box<dyn Future<Output = O> + Send + 'a>>;

/// One adapter's result from applying a rule: the outcome code plus
/// whatever opaque id the backend assigned the rule, needed to remove it
/// later (§3 "AdapterRuleOutcome").
#[derive(Debug, Clone)]
pub struct AdapterApplyResult {
    pub outcome: AdapterOutcome,
    pub per_rule_id: Option<String>,
}

/// The backend's own view of a rule this adapter previously applied,
/// as returned by `query` (§4.A capability interface).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterRuleQuery {
    pub per_rule_id: String,
    pub present: bool,
    pub native_description: String,
}

/// Object-safe async contract, same shape as [`crate::bus::Bus`] and
/// [`crate::detect::detector::Detector`]. Adapters are stateless
/// externally — they hold only connection resources — and must be
/// idempotent on retry of the same `rule_id` (§4.A).
pub trait RuleAdapter: Send + Sync {
    fn id(&self) -> &str;

    fn apply<'a>(&'a self, rule: &'a UniversalRule) -> AdapterFuture<'a, AdapterApplyResult>;

    fn remove<'a>(&'a self, rule_id: &'a RuleId, per_rule_id: Option<&'a str>) -> AdapterFuture<'a, AdapterOutcome>;

    /// Looks up the backend's current view of a previously-applied rule.
    /// Returns `None` when the id is unknown to this adapter.
    fn query<'a>(&'a self, _per_rule_id: &'a str) -> AdapterFuture<'a, Option<AdapterRuleQuery>> {
        Box::pin(async { None })
    }

    /// Every native rule id this adapter currently owns.
    fn list<'a>(&'a self) -> AdapterFuture<'a, Vec<String>> {
        Box::pin(async { Vec::new() })
    }

    /// Whether this adapter is currently healthy enough to dispatch to
    /// (§4.A "health probing/pause"); the orchestrator skips a paused
    /// adapter rather than counting it as a failed attempt.
    fn is_paused(&self) -> bool {
        false
    }

    /// Marks the adapter unreachable, entered after an `apply`/`remove`
    /// surfaces `AdapterOutcome::Unreachable`.
    fn pause(&self) {}

    /// Probes the backend out-of-band; the periodic health checker
    /// (`crate::adapter::health`) calls this for every paused adapter and
    /// resumes it on success (§4.A "pause the adapter, periodic health
    /// probe").
    fn probe<'a>(&'a self) -> AdapterFuture<'a, AdapterOutcome> {
        Box::pin(async { AdapterOutcome::Ok })
    }

    fn resume(&self) {}
}
