// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A cloud security-group adapter, talking to a vendor rule API over
//! HTTP. Unlike the local packet filter, this backend's rules accept
//! exactly one destination port each, so a `UniversalRule` carrying a
//! port range is split into several native rules and tracked under a
//! single compound `per_rule_id` (§4.A "syntactic restrictions").

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use netdefend_core::error::AdapterOutcome;
use netdefend_core::ids::RuleId;
use netdefend_core::rule::{RuleAction, UniversalRule};
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

use crate::adapter::stats::AdapterStats;
use crate::orchestrator::adapter::{AdapterApplyResult, AdapterRuleQuery, RuleAdapter};

type AdapterFuture<'a, O> = Pin<Box<dyn Future<Output = O> + Send + 'a>>;

const PER_RULE_ID_SEP: &str = ",";

#[derive(Debug, Deserialize)]
struct CreateRuleResponse {
    id: String,
}

pub struct CloudSecurityGroupAdapter {
    id: String,
    base_url: String,
    api_token: Option<String>,
    client: Client,
    paused: AtomicBool,
    stats: Arc<AdapterStats>,
    /// `rule_id -> per_rule_id` of the last successful apply, so a retry
    /// of the same `UniversalRule` updates the existing remote rule(s)
    /// instead of creating duplicates (§4.A "idempotent on retry").
    applied: Mutex<HashMap<RuleId, String>>,
}

impl CloudSecurityGroupAdapter {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>, api_token: Option<String>) -> Self {
        let client = Client::builder().timeout(Duration::from_secs(10)).build().unwrap_or_default();
        Self {
            id: id.into(),
            base_url: base_url.into(),
            api_token,
            client,
            paused: AtomicBool::new(false),
            stats: Arc::new(AdapterStats::default()),
            applied: Mutex::new(HashMap::new()),
        }
    }

    pub fn stats(&self) -> Arc<AdapterStats> {
        Arc::clone(&self.stats)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn classify_error(err: &reqwest::Error) -> AdapterOutcome {
        if err.is_timeout() || err.is_connect() {
            return AdapterOutcome::Unreachable;
        }
        match err.status() {
            Some(status) if status.is_server_error() => AdapterOutcome::Transient,
            Some(_) => AdapterOutcome::Permanent,
            None => AdapterOutcome::Transient,
        }
    }

    /// One segment per native rule this backend will need; a port range
    /// wider than a single port is split one-port-per-segment.
    fn port_segments(rule: &UniversalRule) -> Vec<Option<(u16, u16)>> {
        match rule.rule_match.dst_ports {
            None => vec![None],
            Some((lo, hi)) if lo == hi => vec![Some((lo, hi))],
            Some((lo, hi)) => (lo..=hi).map(|p| Some((p, p))).collect(),
        }
    }

    fn rule_payload(rule: &UniversalRule, port: Option<(u16, u16)>) -> serde_json::Value {
        let verdict = match rule.action {
            RuleAction::Allow => "allow",
            RuleAction::Deny => "deny",
            RuleAction::RateLimit { .. } => "rate_limit",
            RuleAction::Quarantine { .. } => "quarantine",
            RuleAction::Monitor => "monitor",
        };
        serde_json::json!({
            "src_cidr": rule.rule_match.src_cidr.map(|c| format!("{}/{}", c.addr, c.prefix_len)),
            "dst_cidr": rule.rule_match.dst_cidr.map(|c| format!("{}/{}", c.addr, c.prefix_len)),
            "port": port.map(|(lo, _)| lo),
            "action": verdict,
            "origin_rule_id": rule.rule_id.to_string(),
        })
    }

    /// Worse-outcome-wins combination across every segment's result
    /// (§4.A "partial success is acceptable and tracked per-adapter").
    fn worst(outcomes: &[AdapterOutcome]) -> AdapterOutcome {
        if outcomes.iter().any(|o| matches!(o, AdapterOutcome::Unreachable)) {
            AdapterOutcome::Unreachable
        } else if outcomes.iter().any(|o| matches!(o, AdapterOutcome::Permanent)) {
            AdapterOutcome::Permanent
        } else if outcomes.iter().any(|o| matches!(o, AdapterOutcome::Transient)) {
            AdapterOutcome::Transient
        } else {
            AdapterOutcome::Ok
        }
    }
}

impl RuleAdapter for CloudSecurityGroupAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply<'a>(&'a self, rule: &'a UniversalRule) -> AdapterFuture<'a, AdapterApplyResult> {
        Box::pin(async move {
            let segments = Self::port_segments(rule);
            let previous_ids: Vec<String> = self
                .applied
                .lock()
                .get(&rule.rule_id)
                .map(|ids| ids.split(PER_RULE_ID_SEP).map(str::to_string).collect())
                .unwrap_or_default();

            let results = join_all(segments.into_iter().enumerate().map(|(i, port)| {
                let existing = previous_ids.get(i).cloned();
                async move {
                    let body = Self::rule_payload(rule, port);
                    let req = match &existing {
                        // A previous apply already created this segment:
                        // update it in place rather than creating a
                        // duplicate native rule.
                        Some(id) => self.apply_auth(self.client.put(self.url(&format!("/api/v1/rules/{id}"))).json(&body)),
                        None => self.apply_auth(self.client.post(self.url("/api/v1/rules")).json(&body)),
                    };
                    match req.send().await.and_then(reqwest::Response::error_for_status) {
                        Ok(resp) => match &existing {
                            Some(id) => (AdapterOutcome::Ok, Some(id.clone())),
                            None => match resp.json::<CreateRuleResponse>().await {
                                Ok(parsed) => (AdapterOutcome::Ok, Some(parsed.id)),
                                Err(err) => {
                                    warn!(adapter = %self.id, error = %err, "cloud adapter response decode failed");
                                    (AdapterOutcome::Transient, None)
                                }
                            },
                        },
                        Err(err) => (Self::classify_error(&err), existing),
                    }
                }
            }))
            .await;

            let outcomes: Vec<AdapterOutcome> = results.iter().map(|(o, _)| *o).collect();
            let outcome = Self::worst(&outcomes);
            match outcome {
                AdapterOutcome::Ok => self.stats.applies_ok.fetch_add(1, Ordering::Relaxed),
                AdapterOutcome::Transient => self.stats.applies_transient.fetch_add(1, Ordering::Relaxed),
                AdapterOutcome::Permanent => self.stats.applies_permanent.fetch_add(1, Ordering::Relaxed),
                AdapterOutcome::Unreachable => self.stats.applies_unreachable.fetch_add(1, Ordering::Relaxed),
            };
            if matches!(outcome, AdapterOutcome::Unreachable) {
                self.pause();
            }
            let ids: Vec<String> = results.into_iter().filter_map(|(_, id)| id).collect();
            let per_rule_id = (!ids.is_empty()).then(|| ids.join(PER_RULE_ID_SEP));
            match &per_rule_id {
                Some(ids_str) => {
                    self.applied.lock().insert(rule.rule_id, ids_str.clone());
                }
                None => {
                    self.applied.lock().remove(&rule.rule_id);
                }
            }
            AdapterApplyResult { outcome, per_rule_id }
        })
    }

    fn remove<'a>(&'a self, rule_id: &'a RuleId, per_rule_id: Option<&'a str>) -> AdapterFuture<'a, AdapterOutcome> {
        Box::pin(async move {
            self.applied.lock().remove(rule_id);
            let Some(ids) = per_rule_id else { return AdapterOutcome::Ok };
            let outcomes = join_all(ids.split(PER_RULE_ID_SEP).map(|id| async move {
                let req = self.apply_auth(self.client.delete(self.url(&format!("/api/v1/rules/{id}"))));
                match req.send().await.and_then(reqwest::Response::error_for_status) {
                    Ok(_) => AdapterOutcome::Ok,
                    // A 404 on delete means the rule is already gone — idempotent success.
                    Err(err) if err.status().map(|s| s.as_u16()) == Some(404) => AdapterOutcome::Ok,
                    Err(err) => Self::classify_error(&err),
                }
            }))
            .await;
            let outcome = Self::worst(&outcomes);
            self.stats.removes.fetch_add(1, Ordering::Relaxed);
            if matches!(outcome, AdapterOutcome::Unreachable) {
                self.pause();
            }
            outcome
        })
    }

    fn query<'a>(&'a self, per_rule_id: &'a str) -> AdapterFuture<'a, Option<AdapterRuleQuery>> {
        Box::pin(async move {
            let ids: Vec<&str> = per_rule_id.split(PER_RULE_ID_SEP).collect();
            let results = join_all(ids.iter().map(|id| async move {
                let req = self.apply_auth(self.client.get(self.url(&format!("/api/v1/rules/{id}"))));
                req.send().await.and_then(reqwest::Response::error_for_status).is_ok()
            }))
            .await;
            if results.is_empty() {
                return None;
            }
            Some(AdapterRuleQuery {
                per_rule_id: per_rule_id.to_string(),
                present: results.iter().all(|ok| *ok),
                native_description: format!("{} native segment(s)", ids.len()),
            })
        })
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
        self.stats.pauses.fetch_add(1, Ordering::Relaxed);
    }

    fn probe<'a>(&'a self) -> AdapterFuture<'a, AdapterOutcome> {
        Box::pin(async move {
            let req = self.apply_auth(self.client.get(self.url("/api/v1/health")));
            match req.send().await.and_then(reqwest::Response::error_for_status) {
                Ok(_) => AdapterOutcome::Ok,
                Err(err) => Self::classify_error(&err),
            }
        })
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
#[path = "cloud_tests.rs"]
mod tests;
