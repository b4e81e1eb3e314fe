// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires every stage (§4 A-I) into one running process and drives the
//! hot path: `features` bus -> ensemble -> agent -> orchestrator ->
//! audit/alert. The synchronous HTTP surfaces (§6) share these same
//! components rather than duplicating any of the detect/decide/apply
//! logic.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use netdefend_core::artifact::ArtifactHandle;
use netdefend_core::config::EngineConfig;
use netdefend_core::feature::{FeatureVector, FEATURE_SLOTS};
use netdefend_core::record::CommonRecord;
use netdefend_core::state::{AgentContext, STATE_SLOTS};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::adapter::stats::AdapterStats;
use crate::adapter::{spawn_health_checker, LocalFilterAdapter};
use crate::agent::artifact::{AgentArtifact, AgentRuntime, ArtifactWatcher as AgentArtifactWatcher};
use crate::agent::stats::AgentStats;
use crate::agent::Agent;
use crate::audit::{AuditOrchestratorEvents, AuditTrail};
use crate::alerting::{Alerter, LogSink};
use crate::api;
use crate::bus::inproc::InprocBus;
use crate::bus::nats::{NatsBus, NatsBusConfig};
use crate::bus::stats::BusStats;
use crate::bus::{Bus, BusMessage};
use crate::config::Config;
use crate::detect::artifact::{apply_overrides, build_runtime, ArtifactWatcher as EnsembleArtifactWatcher, EnsembleArtifact};
use crate::detect::ensemble::{Ensemble, EnsembleRuntime};
use crate::detect::stats::DetectionStats;
use crate::features::engine::FeatureEngine;
use crate::features::stats::FeatureStats;
use crate::ingest::normalizer::Normalizer;
use crate::ingest::stats::IngestStats;
use crate::orchestrator::adapter::RuleAdapter;
use crate::orchestrator::{Orchestrator, OrchestratorEvents, RuleOrigin, SubmitOutcome};

const SCAN_INTERVAL: Duration = Duration::from_secs(30);
const PREDICT_BUDGET: Duration = Duration::from_millis(200);

/// Everything a synchronous HTTP handler needs to reach into the
/// running pipeline (§6).
pub struct EngineState {
    pub normalizer: Arc<Normalizer>,
    pub ensemble: Arc<Ensemble>,
    pub agent: Arc<Agent>,
    pub orchestrator: Arc<Orchestrator>,
    pub audit_trail: Arc<AuditTrail>,
    pub alerter: Arc<Alerter>,
    pub ingest_stats: Arc<IngestStats>,
    pub feature_stats: Arc<FeatureStats>,
    pub adapter_stats: Vec<(String, Arc<AdapterStats>)>,
    /// `None` on the NATS backend, which tracks its own delivery
    /// counters externally rather than through this in-process struct.
    pub normalized_bus_stats: Option<Arc<BusStats>>,
    pub features_bus_stats: Option<Arc<BusStats>>,
    pub shutdown: CancellationToken,
}

/// Builds every stage, spawns the background loops and the features-bus
/// worker, and returns the shared state the HTTP surface runs against.
pub async fn build(config: &Config) -> anyhow::Result<Arc<EngineState>> {
    let engine_config = config.load_engine_config()?;
    let shutdown = CancellationToken::new();

    let (normalized_bus, features_bus, normalized_bus_stats, features_bus_stats) = build_buses(config).await?;

    let ingest_stats = Arc::new(IngestStats::default());
    let normalizer = Arc::new(Normalizer::new(
        engine_config.ingest.dedup_cache_capacity,
        Arc::clone(&ingest_stats),
        Arc::clone(&normalized_bus),
        Duration::from_millis(engine_config.ingest.publish_deadline_ms),
        engine_config.ingest.publish_retry,
    ));

    let feature_stats = Arc::new(FeatureStats::default());
    let feature_engine = FeatureEngine::new(
        engine_config.feature_engine.clone(),
        config.workers as u32,
        Arc::clone(&normalized_bus),
        Arc::clone(&features_bus),
        Arc::clone(&feature_stats),
    );
    tokio::spawn(feature_engine.run());

    let (ensemble, ensemble_watch) = build_ensemble(config, &engine_config);
    if let Some((path, handle)) = ensemble_watch {
        let watcher_shutdown = shutdown.clone();
        tokio::spawn(async move {
            EnsembleArtifactWatcher::new(path).run(handle, watcher_shutdown).await;
        });
    }

    let (agent, agent_watch) = build_agent(config, &engine_config);
    if let Some((path, handle)) = agent_watch {
        let watcher_shutdown = shutdown.clone();
        tokio::spawn(async move {
            AgentArtifactWatcher::new(path).run(handle, watcher_shutdown).await;
        });
    }

    let (adapters, adapter_stats) = build_adapters(config);
    spawn_health_checker(adapters.clone(), shutdown.clone(), SCAN_INTERVAL);

    let audit_trail = Arc::new(AuditTrail::new());
    let alerter = Arc::new(Alerter::new(vec![Arc::new(LogSink::new("log"))], engine_config.alerting.dedup_window_ms));
    let events: Arc<dyn OrchestratorEvents> =
        Arc::new(AuditOrchestratorEvents::new(Arc::clone(&audit_trail), Arc::clone(&alerter)));
    let orchestrator = Arc::new(Orchestrator::new(
        adapters,
        engine_config.clone(),
        config.protected_assets(),
        Vec::new(),
        events,
    ));

    tokio::spawn(Arc::clone(&orchestrator).run_expiry_loop(shutdown.clone(), SCAN_INTERVAL));
    tokio::spawn(Arc::clone(&alerter).run_prune_loop(shutdown.clone(), SCAN_INTERVAL));
    tokio::spawn(Arc::clone(&audit_trail).run_purge_loop(engine_config.audit.retention_ms, shutdown.clone(), SCAN_INTERVAL));

    spawn_detection_worker(
        Arc::clone(&features_bus),
        Arc::clone(&ensemble),
        Arc::clone(&agent),
        Arc::clone(&orchestrator),
        Arc::clone(&audit_trail),
        Arc::clone(&alerter),
    );

    Ok(Arc::new(EngineState {
        normalizer,
        ensemble,
        agent,
        orchestrator,
        audit_trail,
        alerter,
        ingest_stats,
        feature_stats,
        adapter_stats,
        normalized_bus_stats,
        features_bus_stats,
        shutdown,
    }))
}

/// Builds the pipeline and serves the HTTP surface until shutdown.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = build(&config).await?;

    let ctrl_c_shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        ctrl_c_shutdown.cancel();
    });

    let shutdown = state.shutdown.clone();
    let router = api::build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "netdefend listening");
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;
    Ok(())
}

type Buses = (Arc<dyn Bus<CommonRecord>>, Arc<dyn Bus<FeatureVector>>, Option<Arc<BusStats>>, Option<Arc<BusStats>>);

async fn build_buses(config: &Config) -> anyhow::Result<Buses> {
    let partitions = config.workers as u32;
    match config.bus.as_str() {
        "nats" => {
            let url = config
                .nats_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("--nats-url is required when --bus nats"))?;
            let normalized = NatsBus::connect(&NatsBusConfig {
                url: url.clone(),
                token: None,
                prefix: "netdefend.normalized".to_string(),
                partition_count: partitions,
            })
            .await?;
            let features = NatsBus::connect(&NatsBusConfig {
                url,
                token: None,
                prefix: "netdefend.features".to_string(),
                partition_count: partitions,
            })
            .await?;
            Ok((Arc::new(normalized), Arc::new(features), None, None))
        }
        _ => {
            let normalized: InprocBus<CommonRecord> = InprocBus::new(partitions, 4_096);
            let features: InprocBus<FeatureVector> = InprocBus::new(partitions, 4_096);
            let normalized_stats = normalized.stats();
            let features_stats = features.stats();
            Ok((Arc::new(normalized), Arc::new(features), Some(normalized_stats), Some(features_stats)))
        }
    }
}

fn build_ensemble(
    config: &Config,
    engine_config: &EngineConfig,
) -> (Arc<Ensemble>, Option<(PathBuf, Arc<ArtifactHandle<EnsembleRuntime>>)>) {
    let mut artifact = match &config.ensemble_artifact {
        Some(path) => EnsembleArtifact::load_from_path(path).unwrap_or_else(|err| {
            warn!(error = %err, path = %path.display(), "failed to load ensemble artifact, starting from the default");
            EnsembleArtifact::default_for_slot_count(FEATURE_SLOTS.len())
        }),
        None => EnsembleArtifact::default_for_slot_count(FEATURE_SLOTS.len()),
    };
    apply_overrides(&mut artifact, &engine_config.ensemble);

    let handle = Arc::new(ArtifactHandle::new(build_runtime(&artifact)));
    let ensemble = Arc::new(Ensemble::new(Arc::clone(&handle), PREDICT_BUDGET, Arc::new(DetectionStats::default())));
    let watch = config.ensemble_artifact.clone().map(|path| (path, handle));
    (ensemble, watch)
}

/// The CLI flag wins over the structured config when both name an agent
/// artifact path.
fn agent_artifact_path(config: &Config, engine_config: &EngineConfig) -> Option<PathBuf> {
    config.agent_artifact.clone().or_else(|| engine_config.agent.artifact_path.as_ref().map(PathBuf::from))
}

fn build_agent(
    config: &Config,
    engine_config: &EngineConfig,
) -> (Arc<Agent>, Option<(PathBuf, Arc<ArtifactHandle<AgentRuntime>>)>) {
    let path = agent_artifact_path(config, engine_config);
    let handle = path.as_ref().map(|p| {
        let artifact = AgentArtifact::load_from_path(p).unwrap_or_else(|err| {
            warn!(error = %err, path = %p.display(), "failed to load agent artifact, starting from the default");
            AgentArtifact::default_for_slot_count(STATE_SLOTS.len())
        });
        Arc::new(ArtifactHandle::new(AgentRuntime::new(&artifact)))
    });

    let agent = Arc::new(Agent::new(
        handle.clone(),
        engine_config.agent.clone(),
        Arc::new(AgentStats::default()),
        "primary-agent",
    ));
    let watch = path.zip(handle);
    (agent, watch)
}

/// Wires the always-available local filter adapter. A cloud
/// security-group adapter (`crate::adapter::CloudSecurityGroupAdapter`)
/// is implemented but isn't wired here — there's no CLI flag yet for its
/// base URL/token, so it's available but unused until one is added.
fn build_adapters(_config: &Config) -> (Vec<Arc<dyn RuleAdapter>>, Vec<(String, Arc<AdapterStats>)>) {
    let local = Arc::new(LocalFilterAdapter::new("local"));
    let stats = vec![("local".to_string(), local.stats())];
    let adapters: Vec<Arc<dyn RuleAdapter>> = vec![local];
    (adapters, stats)
}

/// Subscribes to the features bus and runs detect -> decide -> submit
/// -> audit/alert for every `FeatureVector`, one detached task per
/// message so a slow detection never backs up the bus consumer (§5).
fn spawn_detection_worker(
    features_bus: Arc<dyn Bus<FeatureVector>>,
    ensemble: Arc<Ensemble>,
    agent: Arc<Agent>,
    orchestrator: Arc<Orchestrator>,
    audit_trail: Arc<AuditTrail>,
    alerter: Arc<Alerter>,
) {
    tokio::spawn(async move {
        let handler: Box<dyn Fn(BusMessage<FeatureVector>) + Send + Sync> = Box::new(move |msg| {
            let ensemble = Arc::clone(&ensemble);
            let agent = Arc::clone(&agent);
            let orchestrator = Arc::clone(&orchestrator);
            let audit_trail = Arc::clone(&audit_trail);
            let alerter = Arc::clone(&alerter);
            tokio::spawn(async move {
                process_feature_vector(msg.payload, ensemble, agent, orchestrator, audit_trail, alerter).await;
            });
        });

        if let Err(err) = features_bus.subscribe("pipeline", handler).await {
            warn!(error = %err, "detection worker lost its features subscription");
        }
    });
}

pub(crate) async fn process_feature_vector(
    fv: FeatureVector,
    ensemble: Arc<Ensemble>,
    agent: Arc<Agent>,
    orchestrator: Arc<Orchestrator>,
    audit_trail: Arc<AuditTrail>,
    alerter: Arc<Alerter>,
) {
    let now = crate::clock::now_ms();
    let detection = ensemble.detect(&fv, now).await;
    audit_trail.record_detection(
        detection.detection_id,
        fv.clone(),
        detection.verdicts.clone(),
        detection.aggregate_score,
        detection.aggregate_label,
        now,
    );

    // No external reputation/criticality feed is wired yet (§11); the
    // synchronous `/api/v1/decide` surface lets a caller override this.
    let context = AgentContext::default();
    let cancel = CancellationToken::new();
    let Some(decision) = agent.decide(&detection, &context, &cancel, now).await else {
        return;
    };
    audit_trail.attach_decision(detection.detection_id, decision.clone(), now);

    let origin = RuleOrigin { window_key: fv.context.window_key.clone() };
    let outcome = orchestrator.submit(&decision, &origin);

    let rule = match outcome {
        SubmitOutcome::Applied(rule_id) | SubmitOutcome::Deduped(rule_id) => {
            orchestrator.get_rule(rule_id).map(|(rule, _)| rule)
        }
        SubmitOutcome::Superseded | SubmitOutcome::Rejected => None,
    };
    if let Some(rule) = &rule {
        audit_trail.attach_rule(detection.detection_id, rule.clone(), now);
    }
    alerter.notify(&decision, rule.as_ref(), now);
}
