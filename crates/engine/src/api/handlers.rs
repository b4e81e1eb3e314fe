// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The synchronous surfaces (§6): `detect`, `decide`, `apply`,
//! `rollback`, `list_rules`, `get_audit`, plus ingest, health and stats.
//! Every handler calls straight into the same component the background
//! pipeline drives (§4) — nothing here re-implements detection, policy
//! or orchestration logic.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use netdefend_core::audit::AuditRecord;
use netdefend_core::decision::Decision;
use netdefend_core::detection::Detection;
use netdefend_core::feature::FeatureVector;
use netdefend_core::ids::{DetectionId, RuleId};
use netdefend_core::record::CommonRecord;
use netdefend_core::rule::{RuleState, UniversalRule};
use netdefend_core::state::AgentContext;
use netdefend_core::window::{Window, WindowKey, WindowKind};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::ingest::parsers::Framing;
use crate::orchestrator::{RuleOrigin, SubmitOutcome};

use super::error::ApiError;
use super::EngineState;

// -- Health / stats -----------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health(State(_s): State<Arc<EngineState>>) -> impl IntoResponse {
    Json(HealthResponse { status: "running" })
}

pub async fn stats(State(s): State<Arc<EngineState>>) -> impl IntoResponse {
    let adapters = s.adapter_stats.iter().map(|(id, stats)| (id.clone(), stats.snapshot())).collect::<std::collections::HashMap<_, _>>();

    Json(serde_json::json!({
        "ingest": s.ingest_stats.snapshot(),
        "features": s.feature_stats.snapshot(),
        "detection": s.ensemble.stats().snapshot(),
        "agent": s.agent.stats().snapshot(),
        "orchestrator": s.orchestrator.stats().snapshot(),
        "alerting": s.alerter.stats().snapshot(),
        "audit": s.audit_trail.stats().snapshot(),
        "adapters": adapters,
        "bus": {
            "normalized": s.normalized_bus_stats.as_ref().map(|stats| stats.snapshot()),
            "features": s.features_bus_stats.as_ref().map(|stats| stats.snapshot()),
        },
    }))
}

// -- Ingest ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct IngestQuery {
    pub sensor: Option<String>,
}

fn parse_framing(raw: &str) -> Result<Framing, ApiError> {
    match raw {
        "packet-capture" => Ok(Framing::PacketCapture),
        "flow-v1" => Ok(Framing::FlowV1),
        "flow-v2" => Ok(Framing::FlowV2),
        "host-event" => Ok(Framing::HostEvent),
        other => Err(ApiError::BadRequest(format!("unknown framing: {other}"))),
    }
}

/// `POST /api/v1/ingest/{framing}` — the collector-facing entry point
/// into F (§4.F). Framing comes from the path, never sniffed from the
/// body (§3 "CommonRecord" note on `Framing`).
pub async fn ingest(
    State(s): State<Arc<EngineState>>,
    Path(framing): Path<String>,
    Query(query): Query<IngestQuery>,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let framing = parse_framing(&framing)?;
    s.normalizer.ingest(framing, &body, query.sensor.as_deref()).await;
    Ok(axum::http::StatusCode::ACCEPTED)
}

// -- Detect -----------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DetectRequest {
    Vector { feature_vector: FeatureVector },
    Raw { record: CommonRecord },
}

/// A single-record stand-in window, for the synchronous `detect` surface
/// fed a raw record instead of a feature vector already closed by E
/// (§6 "detect(feature_vector | raw_record + context)").
fn feature_vector_from_record(record: &CommonRecord) -> FeatureVector {
    let key = WindowKey::src_addr(record);
    let mut window = Window::new(key, WindowKind::Tumbling, 0, record.t_start);
    window.aggregates.ingest(record);
    window.end_ms = record.t_end.max(record.t_start) + 1;
    FeatureVector::from_window(&window)
}

pub async fn detect(State(s): State<Arc<EngineState>>, Json(req): Json<DetectRequest>) -> impl IntoResponse {
    let fv = match req {
        DetectRequest::Vector { feature_vector } => feature_vector,
        DetectRequest::Raw { record } => feature_vector_from_record(&record),
    };

    let now = crate::clock::now_ms();
    let detection = s.ensemble.detect(&fv, now).await;
    s.audit_trail.record_detection(
        detection.detection_id,
        fv,
        detection.verdicts.clone(),
        detection.aggregate_score,
        detection.aggregate_label,
        now,
    );
    Json(detection)
}

// -- Decide -------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    pub detection: Option<Detection>,
    pub detection_id: Option<String>,
    #[serde(default)]
    pub context: Option<AgentContext>,
}

fn detection_from_record(record: AuditRecord) -> Detection {
    Detection {
        detection_id: record.detection_id,
        feature_vector_ref: record.feature_vector.id,
        verdicts: record.verdicts,
        aggregate_score: record.aggregate_score,
        aggregate_label: record.aggregate_label,
        decided_at: record.detected_at,
        failed_detectors: Vec::new(),
    }
}

pub async fn decide(
    State(s): State<Arc<EngineState>>,
    Json(req): Json<DecideRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let detection = match req.detection {
        Some(detection) => detection,
        None => {
            let id = req
                .detection_id
                .as_deref()
                .ok_or_else(|| ApiError::BadRequest("either detection or detection_id is required".to_string()))?;
            let uuid = Uuid::parse_str(id).map_err(|_| ApiError::BadRequest(format!("invalid detection_id: {id}")))?;
            let record = s
                .audit_trail
                .get_by_detection(DetectionId(uuid))
                .ok_or_else(|| ApiError::NotFound(format!("no detection {id}")))?;
            detection_from_record(record)
        }
    };

    let context = req.context.unwrap_or_default();
    let now = crate::clock::now_ms();
    let cancel = CancellationToken::new();
    let Some(decision) = s.agent.decide(&detection, &context, &cancel, now).await else {
        return Err(ApiError::Internal("decision was cancelled".to_string()));
    };
    s.audit_trail.attach_decision(detection.detection_id, decision.clone(), now);
    Ok(Json(decision))
}

// -- Apply --------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub decision: Decision,
    pub window_key: String,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub rule_id: Option<RuleId>,
    pub outcome: &'static str,
    pub adapter_outcomes: Vec<netdefend_core::rule::AdapterRuleOutcome>,
}

/// `POST /api/v1/apply` (§6 "apply(decision) -> {rule_id,
/// adapter_outcomes}"). `Orchestrator::submit` only resolves the rule's
/// synthesis/validation/conflict fate synchronously — the adapter apply
/// loop keeps running in the background, so `adapter_outcomes` here is
/// whatever has landed by the time this handler returns, not a
/// guaranteed-final result.
pub async fn apply(State(s): State<Arc<EngineState>>, Json(req): Json<ApplyRequest>) -> impl IntoResponse {
    let origin = RuleOrigin { window_key: WindowKey(req.window_key) };
    let outcome = s.orchestrator.submit(&req.decision, &origin);

    let (rule_id, outcome_str, adapter_outcomes) = match outcome {
        SubmitOutcome::Applied(id) => (Some(id), "applied", rule_outcomes(&s, id)),
        SubmitOutcome::Deduped(id) => (Some(id), "deduped", rule_outcomes(&s, id)),
        SubmitOutcome::Superseded => (None, "superseded", Vec::new()),
        SubmitOutcome::Rejected => (None, "rejected", Vec::new()),
    };

    if let Some(id) = rule_id {
        if let Some((rule, _)) = s.orchestrator.get_rule(id) {
            s.audit_trail.attach_rule(req.decision.detection_ref, rule.clone(), crate::clock::now_ms());
            s.alerter.notify(&req.decision, Some(&rule), crate::clock::now_ms());
        }
    } else {
        s.alerter.notify(&req.decision, None, crate::clock::now_ms());
    }

    Json(ApplyResponse { rule_id, outcome: outcome_str, adapter_outcomes })
}

fn rule_outcomes(state: &EngineState, rule_id: RuleId) -> Vec<netdefend_core::rule::AdapterRuleOutcome> {
    state.orchestrator.get_rule(rule_id).map(|(_, rule_state)| rule_state.adapter_outcomes).unwrap_or_default()
}

// -- Rollback / rules / audit ---------------------------------------------

#[derive(Debug, Serialize)]
pub struct RollbackResponse {
    pub rolled_back: bool,
}

pub async fn rollback(
    State(s): State<Arc<EngineState>>,
    Path(rule_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let uuid = Uuid::parse_str(&rule_id).map_err(|_| ApiError::BadRequest(format!("invalid rule_id: {rule_id}")))?;
    let rolled_back = s.orchestrator.rollback(RuleId(uuid)).await;
    Ok(Json(RollbackResponse { rolled_back }))
}

#[derive(Debug, Serialize)]
pub struct RuleEntry {
    pub rule: UniversalRule,
    pub state: RuleState,
}

pub async fn list_rules(State(s): State<Arc<EngineState>>) -> impl IntoResponse {
    let entries: Vec<RuleEntry> =
        s.orchestrator.list_rules().into_iter().map(|(rule, state)| RuleEntry { rule, state }).collect();
    Json(entries)
}

pub async fn get_audit(State(s): State<Arc<EngineState>>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| ApiError::BadRequest(format!("invalid id: {id}")))?;

    if let Some(record) = s.audit_trail.get_by_detection(DetectionId(uuid)) {
        return Ok(Json(record));
    }
    if let Some(record) = s.audit_trail.get_by_rule(RuleId(uuid)) {
        return Ok(Json(record));
    }
    Err(ApiError::NotFound(format!("no audit record for {id}")))
}
