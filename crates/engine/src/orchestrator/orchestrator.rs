// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ties rule synthesis, validation, conflict detection, the rule store
//! and the adapter dispatch loop into the state machine described in
//! §4.B: `pending -> applying -> active -> expired`;
//! `applying -> failed -> (retry -> applying) | (give_up)`; any state
//! except `expired` -> `rolled_back` by operator action.

use std::net::IpAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use netdefend_core::config::EngineConfig;
use netdefend_core::decision::Decision;
use netdefend_core::error::{AdapterOutcome, ValidationError};
use netdefend_core::ids::{DecisionId, RuleId};
use netdefend_core::rule::{AdapterRuleOutcome, Cidr, RuleLifecycle, UniversalRule};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::adapter::RuleAdapter;
use super::conflict::{self, ConflictOutcome};
use super::store::RuleStore;
use super::stats::OrchestratorStats;
use super::synth::{self, RuleOrigin};
use super::validate;
use crate::retry::Backoff;

/// Hook points for the audit trail and alerting (H, I) without the
/// orchestrator depending on either crate module directly.
pub trait OrchestratorEvents: Send + Sync {
    fn rule_rejected(&self, _rule: &UniversalRule, _err: &ValidationError) {}
    fn rule_active(&self, _rule: &UniversalRule, _outcomes: &[AdapterRuleOutcome]) {}
    fn rule_permanently_failed(&self, _rule: &UniversalRule, _outcomes: &[AdapterRuleOutcome]) {}
    fn rule_rolled_back(&self, _rule_id: RuleId) {}
}

pub struct NoopEvents;
impl OrchestratorEvents for NoopEvents {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Applied(RuleId),
    Deduped(RuleId),
    Superseded,
    Rejected,
}

pub struct Orchestrator {
    store: RuleStore,
    adapters: Vec<Arc<dyn RuleAdapter>>,
    config: EngineConfig,
    stats: Arc<OrchestratorStats>,
    protected_assets: Vec<Cidr>,
    allow_list: Vec<UniversalRule>,
    events: Arc<dyn OrchestratorEvents>,
}

impl Orchestrator {
    pub fn new(
        adapters: Vec<Arc<dyn RuleAdapter>>,
        config: EngineConfig,
        protected_assets: Vec<Cidr>,
        allow_list: Vec<UniversalRule>,
        events: Arc<dyn OrchestratorEvents>,
    ) -> Self {
        Self {
            store: RuleStore::new(),
            adapters,
            config,
            stats: Arc::new(OrchestratorStats::default()),
            protected_assets,
            allow_list,
            events,
        }
    }

    pub fn stats(&self) -> Arc<OrchestratorStats> {
        Arc::clone(&self.stats)
    }

    pub fn list_rules(&self) -> Vec<(UniversalRule, netdefend_core::rule::RuleState)> {
        self.store.all_snapshot()
    }

    pub fn get_rule(&self, rule_id: RuleId) -> Option<(UniversalRule, netdefend_core::rule::RuleState)> {
        self.store.snapshot(rule_id)
    }

    /// Synthesizes, validates and conflict-resolves a rule from
    /// `decision`, then kicks off the apply loop in the background —
    /// `submit` itself returns as soon as the rule's fate (rejected,
    /// deduped, superseded, or accepted for apply) is known (§4.B).
    pub fn submit(self: &Arc<Self>, decision: &Decision, origin: &RuleOrigin) -> SubmitOutcome {
        let now = crate::clock::now_ms();
        let rule = synth::synthesize(decision, origin, &self.config, now);
        self.stats.rules_synthesized.fetch_add(1, Ordering::Relaxed);

        if let Err(err) = validate::validate(
            &rule,
            &self.protected_assets,
            &self.config.orchestrator.max_scope_prefix_len,
            &self.allow_list,
        ) {
            self.stats.rules_rejected.fetch_add(1, Ordering::Relaxed);
            self.events.rule_rejected(&rule, &err);
            return SubmitOutcome::Rejected;
        }

        let live = self.store.live_snapshot();
        match conflict::resolve(&rule, &live) {
            ConflictOutcome::Dedupe { existing } => {
                self.stats.rules_deduped.fetch_add(1, Ordering::Relaxed);
                self.store.bump_ttl(existing, rule.ttl_ms.unwrap_or(0), now);
                SubmitOutcome::Deduped(existing)
            }
            ConflictOutcome::CandidateLoses => {
                self.stats.rules_rejected.fetch_add(1, Ordering::Relaxed);
                SubmitOutcome::Superseded
            }
            ConflictOutcome::CandidateWins { losers } => {
                for loser in &losers {
                    self.store.with_state_mut(*loser, |s| s.lifecycle = RuleLifecycle::RolledBack);
                    self.stats.rules_rolled_back.fetch_add(1, Ordering::Relaxed);
                    self.events.rule_rolled_back(*loser);
                }
                self.stats.rules_superseded.fetch_add(1, Ordering::Relaxed);
                let rule_id = rule.rule_id;
                self.store.insert(rule, now);
                self.spawn_apply_after_removing(rule_id, losers);
                SubmitOutcome::Applied(rule_id)
            }
            ConflictOutcome::NoConflict => {
                let rule_id = rule.rule_id;
                self.store.insert(rule, now);
                self.spawn_apply(rule_id);
                SubmitOutcome::Applied(rule_id)
            }
        }
    }

    fn spawn_apply(self: &Arc<Self>, rule_id: RuleId) {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.apply_with_retry(rule_id).await });
    }

    /// Dispatches removes for the conflict-losing rules before applying
    /// the winning candidate, so an adapter observes `remove` then `add`
    /// in that order for the same match (§4.B "conflict detection" case
    /// (b); §8 S6).
    fn spawn_apply_after_removing(self: &Arc<Self>, rule_id: RuleId, losers: Vec<RuleId>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            for loser in losers {
                if let Some((loser_rule, state)) = this.store.snapshot(loser) {
                    this.dispatch_removes(&loser_rule, &state.adapter_outcomes).await;
                }
            }
            this.apply_with_retry(rule_id).await;
        });
    }

    /// `pending -> applying -> active | failed`; on failure, retries with
    /// bounded exponential backoff until attempts are exhausted, then
    /// gives up and reports a permanent failure (§4.B "Apply").
    async fn apply_with_retry(&self, rule_id: RuleId) {
        let mut backoff = Backoff::new(self.config.orchestrator.adapter_retry);
        loop {
            self.store.with_state_mut(rule_id, |s| s.lifecycle = RuleLifecycle::Applying);
            let Some((rule, _)) = self.store.snapshot(rule_id) else { return };
            let now = crate::clock::now_ms();
            let outcomes = self.apply_once(&rule, now).await;
            let any_ok = outcomes.iter().any(|o| matches!(o.outcome, AdapterOutcome::Ok));
            // `Permanent` means an adapter rejected the rule outright (per
            // `AdapterOutcome::is_retryable`, only `Transient` warrants a
            // retry) — retrying it would just repeat the same rejection,
            // so give up without consuming the backoff schedule.
            // `Unreachable` keeps going through the normal retry loop: the
            // adapter has already paused itself and will be excluded from
            // the next `apply_once` until a health probe resumes it.
            let any_permanent = outcomes.iter().any(|o| matches!(o.outcome, AdapterOutcome::Permanent));

            self.store.with_state_mut(rule_id, |s| {
                s.adapter_outcomes = outcomes;
                s.updated_at = now;
                s.lifecycle = if any_ok { RuleLifecycle::Active } else { RuleLifecycle::Failed };
            });

            if any_ok {
                self.stats.rules_active.fetch_add(1, Ordering::Relaxed);
                if let Some((rule, state)) = self.store.snapshot(rule_id) {
                    self.events.rule_active(&rule, &state.adapter_outcomes);
                }
                return;
            }

            self.stats.rules_failed.fetch_add(1, Ordering::Relaxed);
            self.store.with_state_mut(rule_id, |s| s.retry_attempts += 1);

            if any_permanent {
                if let Some((rule, state)) = self.store.snapshot(rule_id) {
                    warn!(rule_id = %rule_id, "adapter reported a permanent failure, giving up without retry");
                    self.events.rule_permanently_failed(&rule, &state.adapter_outcomes);
                }
                return;
            }

            match backoff.next_delay() {
                Some(delay) => {
                    self.stats.apply_retries.fetch_add(1, Ordering::Relaxed);
                    tokio::time::sleep(delay).await;
                }
                None => {
                    if let Some((rule, state)) = self.store.snapshot(rule_id) {
                        warn!(rule_id = %rule_id, "adapter apply retries exhausted, giving up");
                        self.events.rule_permanently_failed(&rule, &state.adapter_outcomes);
                    }
                    return;
                }
            }
        }
    }

    async fn apply_once(&self, rule: &UniversalRule, now_ms: i64) -> Vec<AdapterRuleOutcome> {
        join_all(self.adapters.iter().filter(|adapter| !adapter.is_paused()).map(|adapter| async move {
            let result = adapter.apply(rule).await;
            AdapterRuleOutcome {
                adapter_id: adapter.id().to_string(),
                outcome: result.outcome,
                per_rule_id: result.per_rule_id,
                attempts: 1,
                last_attempt_at: now_ms,
            }
        }))
        .await
    }

    async fn dispatch_removes(&self, rule: &UniversalRule, outcomes: &[AdapterRuleOutcome]) {
        join_all(self.adapters.iter().filter(|adapter| !adapter.is_paused()).map(|adapter| {
            let per_rule_id = outcomes.iter().find(|o| o.adapter_id == adapter.id()).and_then(|o| o.per_rule_id.clone());
            async move {
                let _ = adapter.remove(&rule.rule_id, per_rule_id.as_deref()).await;
            }
        }))
        .await;
    }

    /// Background loop: scans `active` rules for elapsed `ttl`,
    /// transitions them to `expired`, and dispatches adapter removes
    /// (§4.B "Expiry and rollback").
    pub async fn run_expiry_loop(self: Arc<Self>, shutdown: CancellationToken, scan_interval: Duration) {
        let mut tick = tokio::time::interval(scan_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tick.tick() => {}
            }
            self.sweep_expired().await;
        }
    }

    async fn sweep_expired(&self) {
        let now = crate::clock::now_ms();
        for (rule, state) in self.store.all_snapshot() {
            if !matches!(state.lifecycle, RuleLifecycle::Active) {
                continue;
            }
            let Some(ttl) = rule.ttl_ms else { continue };
            if now.saturating_sub(state.created_at) >= ttl {
                self.store.with_state_mut(rule.rule_id, |s| s.lifecycle = RuleLifecycle::Expired);
                self.stats.rules_expired.fetch_add(1, Ordering::Relaxed);
                self.dispatch_removes(&rule, &state.adapter_outcomes).await;
            }
        }
    }

    /// Explicit rollback by `rule_id`, always honored unless the rule has
    /// already expired (§4.B: "any state except `expired` ->
    /// `rolled_back`").
    pub async fn rollback(&self, rule_id: RuleId) -> bool {
        let Some((rule, state)) = self.store.snapshot(rule_id) else { return false };
        if matches!(state.lifecycle, RuleLifecycle::Expired) {
            return false;
        }
        self.store.with_state_mut(rule_id, |s| s.lifecycle = RuleLifecycle::RolledBack);
        self.stats.rules_rolled_back.fetch_add(1, Ordering::Relaxed);
        self.dispatch_removes(&rule, &state.adapter_outcomes).await;
        true
    }

    /// Explicit rollback by the Decision that originated the rule.
    pub async fn rollback_by_origin(&self, decision_ref: DecisionId) -> bool {
        let target =
            self.store.all_snapshot().into_iter().find(|(rule, _)| rule.origin_decision_ref == decision_ref);
        match target {
            Some((rule, _)) => self.rollback(rule.rule_id).await,
            None => false,
        }
    }
}

/// Helper for callers assembling `protected_assets` from config strings.
pub fn parse_cidr(s: &str) -> Option<Cidr> {
    let (addr, prefix_len) = s.split_once('/')?;
    let addr: IpAddr = addr.parse().ok()?;
    let prefix_len: u8 = prefix_len.parse().ok()?;
    Some(Cidr { addr, prefix_len })
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
