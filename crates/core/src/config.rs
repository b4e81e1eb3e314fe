// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured configuration shared by every component, as enumerated in
//! §6 "Configuration". Deserialized from a TOML file by the engine's
//! `clap`-derived CLI config; kept in `core` so it can be unit-tested and
//! referenced from any crate without a circular dependency on the engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::decision::Action;
use crate::window::{KeyProjection, WindowKind};

fn default_gap_ms() -> i64 {
    300_000
}

fn default_key_projection() -> KeyProjection {
    KeyProjection::SrcAddr
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub kind: WindowKind,
    pub span_ms: i64,
    /// Required for `Sliding`, ignored otherwise.
    #[serde(default)]
    pub slide_ms: Option<i64>,
    /// Required for `Session`, ignored otherwise.
    #[serde(default = "default_gap_ms")]
    pub gap_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEngineConfig {
    #[serde(default = "default_key_projection")]
    pub key_projection: KeyProjection,
    pub windows: Vec<WindowSpec>,
    pub allowed_lateness_ms: i64,
    pub per_key_memory_cap: usize,
}

impl Default for FeatureEngineConfig {
    fn default() -> Self {
        Self {
            key_projection: default_key_projection(),
            windows: vec![
                WindowSpec { kind: WindowKind::Tumbling, span_ms: 30_000, slide_ms: None, gap_ms: default_gap_ms() },
                WindowSpec {
                    kind: WindowKind::Sliding,
                    span_ms: 60_000,
                    slide_ms: Some(10_000),
                    gap_ms: default_gap_ms(),
                },
            ],
            allowed_lateness_ms: 5_000,
            per_key_memory_cap: 10_000,
        }
    }
}

/// Ingest-stage (F) tuning: dedup cache sizing and publish retry/backoff
/// when the bus refuses a publish (§4.F).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    pub dedup_cache_capacity: usize,
    pub publish_deadline_ms: u64,
    pub publish_retry: AdapterRetryConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            dedup_cache_capacity: 100_000,
            publish_deadline_ms: 50,
            publish_retry: AdapterRetryConfig { max_attempts: 3, base_ms: 20, max_ms: 500 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleOverrides {
    /// Overrides artifact-supplied weights when present (§6: "sourced
    /// from artifact metadata unless overridden").
    pub weights: Option<HashMap<String, f64>>,
    pub threshold: Option<f64>,
}

impl Default for EnsembleOverrides {
    fn default() -> Self {
        Self { weights: None, threshold: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub artifact_path: Option<String>,
    /// Fallback rule table thresholds (§4.C): `score >= high` -> deny,
    /// `medium <= score < high` -> rate_limit(med), else monitor.
    pub fallback_high_threshold: f64,
    pub fallback_medium_threshold: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { artifact_path: None, fallback_high_threshold: 0.8, fallback_medium_threshold: 0.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdapterRetryConfig {
    pub max_attempts: u32,
    pub base_ms: u64,
    pub max_ms: u64,
}

impl Default for AdapterRetryConfig {
    fn default() -> Self {
        Self { max_attempts: 5, base_ms: 200, max_ms: 10_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub action_base_priority: HashMap<String, u16>,
    pub max_scope_prefix_len: HashMap<String, u8>,
    pub ttl_ms: HashMap<String, i64>,
    pub adapter_retry: AdapterRetryConfig,
    pub default_rate_limit_pps: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let mut action_base_priority = HashMap::new();
        action_base_priority.insert("deny".to_string(), 10);
        action_base_priority.insert("quarantine".to_string(), 20);
        action_base_priority.insert("rate_limit".to_string(), 100);
        action_base_priority.insert("monitor".to_string(), 60_000);
        action_base_priority.insert("allow".to_string(), 60_000);

        let mut max_scope_prefix_len = HashMap::new();
        max_scope_prefix_len.insert("deny".to_string(), 24);
        max_scope_prefix_len.insert("quarantine".to_string(), 32);
        max_scope_prefix_len.insert("rate_limit".to_string(), 16);

        let mut ttl_ms = HashMap::new();
        ttl_ms.insert("quarantine_short".to_string(), 3_600_000);
        ttl_ms.insert("quarantine_long".to_string(), 86_400_000);
        ttl_ms.insert("rate_limit".to_string(), 1_800_000);
        ttl_ms.insert("deny".to_string(), 21_600_000);

        Self {
            action_base_priority,
            max_scope_prefix_len,
            ttl_ms,
            adapter_retry: AdapterRetryConfig::default(),
            default_rate_limit_pps: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub dedup_window_ms: i64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { dedup_window_ms: 300_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    pub retention_ms: i64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { retention_ms: 30 * 86_400_000 }
    }
}

/// The full structured config loaded from `--config <path>` (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub feature_engine: FeatureEngineConfig,
    #[serde(default)]
    pub ensemble: EnsembleOverrides,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub alerting: AlertConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ingest: IngestConfig::default(),
            feature_engine: FeatureEngineConfig::default(),
            ensemble: EnsembleOverrides::default(),
            agent: AgentConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            alerting: AlertConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn ttl_for_action(&self, action: Action) -> Option<i64> {
        use crate::decision::QuarantineDuration;
        let key = match action {
            Action::Quarantine(QuarantineDuration::Short) => "quarantine_short",
            Action::Quarantine(QuarantineDuration::Long) => "quarantine_long",
            Action::RateLimit(_) => "rate_limit",
            Action::Deny => "deny",
            Action::Allow | Action::Monitor => return None,
        };
        self.orchestrator.ttl_ms.get(key).copied()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
