// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the end-to-end scenario tests. Each scenario
//! drives the real `netdefend_engine` components directly (ensemble,
//! agent, orchestrator) rather than standing up a full process, so the
//! expected outcome of every synthetic feature vector can be hand
//! computed instead of depending on a loaded artifact.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use netdefend_core::artifact::ArtifactHandle;
use netdefend_core::config::{AgentConfig, EngineConfig};
use netdefend_core::error::{AdapterOutcome, DetectorError};
use netdefend_core::feature::{FeatureContext, FeatureVector, FEATURE_SLOTS};
use netdefend_core::ids::{FeatureVectorId, RuleId};
use netdefend_core::rule::UniversalRule;
use netdefend_core::verdict::DetectorVerdict;
use netdefend_core::window::WindowKey;
use netdefend_engine::adapter::LocalFilterAdapter;
use netdefend_engine::agent::stats::AgentStats;
use netdefend_engine::agent::Agent;
use netdefend_engine::audit::AuditTrail;
use netdefend_engine::alerting::Alerter;
use netdefend_engine::detect::detector::{Detector, SupervisedClassifier};
use netdefend_engine::detect::ensemble::{Ensemble, EnsembleRuntime};
use netdefend_engine::detect::stats::DetectionStats;
use netdefend_engine::orchestrator::adapter::{AdapterApplyResult, RuleAdapter};
use netdefend_engine::orchestrator::{NoopEvents, Orchestrator};

const PREDICT_BUDGET: Duration = Duration::from_millis(200);

/// A flat-all-zeros feature vector, with one slot set by name, carrying
/// `window_key` for rule synthesis to recover an address/port from.
pub fn feature_vector(window_key: &str, slot: &str, value: f64) -> FeatureVector {
    let mut slots = vec![0.0; FEATURE_SLOTS.len()];
    let idx = FEATURE_SLOTS.iter().position(|(name, ..)| *name == slot).expect("known slot name");
    slots[idx] = value;
    FeatureVector {
        id: FeatureVectorId::new(),
        version: 1,
        slots,
        context: FeatureContext { window_key: WindowKey(window_key.to_string()), window_start_ms: 0, window_end_ms: 30_000 },
    }
}

/// An ensemble with a single supervised classifier that reads one named
/// slot and ignores the rest, so the resulting `aggregate_score` can be
/// computed by hand: `sigmoid(weight * slot_value + bias)`.
pub fn single_slot_ensemble(slot: &str, weight: f64, bias: f64, threshold: f64) -> Arc<Ensemble> {
    let idx = FEATURE_SLOTS.iter().position(|(name, ..)| *name == slot).expect("known slot name");
    let mut weights = vec![0.0; FEATURE_SLOTS.len()];
    weights[idx] = weight;

    let detector: Box<dyn Detector> = Box::new(SupervisedClassifier::new("d1".to_string(), weights, bias));
    let mut detector_weights = HashMap::new();
    detector_weights.insert("d1".to_string(), 1.0);

    let runtime = EnsembleRuntime::new(vec![detector], detector_weights, threshold);
    let handle = Arc::new(ArtifactHandle::new(runtime));
    Arc::new(Ensemble::new(handle, PREDICT_BUDGET, Arc::new(DetectionStats::default())))
}

/// An ensemble whose only detector always errors, so `detect` returns
/// `aggregate_label = Unknown`, `aggregate_score = NaN` (§4.D).
pub fn always_failing_ensemble() -> Arc<Ensemble> {
    let detector: Box<dyn Detector> = Box::new(AlwaysErrors);
    let runtime = EnsembleRuntime::new(vec![detector], HashMap::new(), 0.5);
    let handle = Arc::new(ArtifactHandle::new(runtime));
    Arc::new(Ensemble::new(handle, PREDICT_BUDGET, Arc::new(DetectionStats::default())))
}

struct AlwaysErrors;

impl Detector for AlwaysErrors {
    fn id(&self) -> &str {
        "always-errors"
    }

    fn predict<'a>(
        &'a self,
        _fv: &'a FeatureVector,
    ) -> Pin<Box<dyn Future<Output = Result<DetectorVerdict, DetectorError>> + Send + 'a>> {
        Box::pin(async { Err(DetectorError { detector_id: "always-errors".to_string(), reason: "offline".to_string() }) })
    }
}

/// A policy agent with no learned artifact, always using the rule-table
/// fallback (§4.C) against the given thresholds.
pub fn fallback_agent(high_threshold: f64, medium_threshold: f64) -> Arc<Agent> {
    let config = AgentConfig { artifact_path: None, fallback_high_threshold: high_threshold, fallback_medium_threshold: medium_threshold };
    Arc::new(Agent::new(None, config, Arc::new(AgentStats::default()), "test-agent"))
}

/// Builds an `Orchestrator` with a `LocalFilterAdapter` (always `Ok`)
/// and the given engine config, backed by a no-op events sink.
pub fn orchestrator_with_local_adapter(engine_config: EngineConfig) -> Arc<Orchestrator> {
    let local: Arc<dyn RuleAdapter> = Arc::new(LocalFilterAdapter::new("local"));
    Arc::new(Orchestrator::new(vec![local], engine_config, Vec::new(), Vec::new(), Arc::new(NoopEvents)))
}

/// Builds an `Orchestrator` against an explicit adapter set, for
/// scenarios that need adapter-level control over outcomes.
pub fn orchestrator_with_adapters(engine_config: EngineConfig, adapters: Vec<Arc<dyn RuleAdapter>>) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(adapters, engine_config, Vec::new(), Vec::new(), Arc::new(NoopEvents)))
}

pub fn audit_and_alerter() -> (Arc<AuditTrail>, Arc<Alerter>) {
    (Arc::new(AuditTrail::new()), Arc::new(Alerter::new(Vec::new(), 300_000)))
}

/// Returns `Some(rule_state)` once the rule's lifecycle has left
/// `pending`/`applying`, polling at a short fixed interval up to
/// `timeout`. `None` means the apply loop never settled in time.
pub async fn poll_settled(
    orchestrator: &Orchestrator,
    rule_id: RuleId,
    timeout: Duration,
) -> Option<(UniversalRule, netdefend_core::rule::RuleState)> {
    use netdefend_core::rule::RuleLifecycle;
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some((rule, state)) = orchestrator.get_rule(rule_id) {
            if !matches!(state.lifecycle, RuleLifecycle::Pending | RuleLifecycle::Applying) {
                return Some((rule, state));
            }
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Adapter that always returns `AdapterOutcome::Transient`.
pub struct AlwaysTransientAdapter {
    id: String,
}

impl AlwaysTransientAdapter {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl RuleAdapter for AlwaysTransientAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply<'a>(&'a self, _rule: &'a UniversalRule) -> Pin<Box<dyn Future<Output = AdapterApplyResult> + Send + 'a>> {
        Box::pin(async { AdapterApplyResult { outcome: AdapterOutcome::Transient, per_rule_id: None } })
    }

    fn remove<'a>(
        &'a self,
        _rule_id: &'a netdefend_core::ids::RuleId,
        _per_rule_id: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = AdapterOutcome> + Send + 'a>> {
        Box::pin(async { AdapterOutcome::Ok })
    }
}

/// Adapter that returns `Transient` for its first `fail_count` calls,
/// then `Ok` for every call after.
pub struct FlakyAdapter {
    id: String,
    fail_count: u32,
    calls: AtomicU32,
}

impl FlakyAdapter {
    pub fn new(id: impl Into<String>, fail_count: u32) -> Self {
        Self { id: id.into(), fail_count, calls: AtomicU32::new(0) }
    }
}

impl RuleAdapter for FlakyAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply<'a>(&'a self, _rule: &'a UniversalRule) -> Pin<Box<dyn Future<Output = AdapterApplyResult> + Send + 'a>> {
        Box::pin(async move {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let outcome = if call <= self.fail_count { AdapterOutcome::Transient } else { AdapterOutcome::Ok };
            AdapterApplyResult { outcome, per_rule_id: None }
        })
    }

    fn remove<'a>(
        &'a self,
        _rule_id: &'a netdefend_core::ids::RuleId,
        _per_rule_id: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = AdapterOutcome> + Send + 'a>> {
        Box::pin(async { AdapterOutcome::Ok })
    }
}

/// Adapter that records every `apply`/`remove` call, in order, into a
/// shared log — used to assert dispatch ordering (§8 S6: "remove then
/// add in that order").
pub struct RecordingAdapter {
    id: String,
    pub log: Arc<parking_lot::Mutex<Vec<String>>>,
}

impl RecordingAdapter {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), log: Arc::new(parking_lot::Mutex::new(Vec::new())) }
    }
}

impl RuleAdapter for RecordingAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply<'a>(&'a self, rule: &'a UniversalRule) -> Pin<Box<dyn Future<Output = AdapterApplyResult> + Send + 'a>> {
        Box::pin(async move {
            self.log.lock().push(format!("apply:{}", rule.rule_id));
            AdapterApplyResult { outcome: AdapterOutcome::Ok, per_rule_id: Some(rule.rule_id.to_string()) }
        })
    }

    fn remove<'a>(
        &'a self,
        rule_id: &'a netdefend_core::ids::RuleId,
        _per_rule_id: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = AdapterOutcome> + Send + 'a>> {
        Box::pin(async move {
            self.log.lock().push(format!("remove:{rule_id}"));
            AdapterOutcome::Ok
        })
    }
}
