// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level CLI configuration. Structured pipeline options (window
//! specs, thresholds, retry policy, ...) live in `netdefend_core::config`
//! and are loaded from the `--config` TOML file referenced here.

use std::path::PathBuf;

use clap::Parser;
use netdefend_core::config::EngineConfig;
use netdefend_core::rule::Cidr;
use tracing_subscriber::EnvFilter;

/// Real-time network threat detection and automated firewall policy engine.
#[derive(Debug, Parser)]
#[command(name = "netdefend", version, about)]
pub struct Config {
    /// HTTP port for the synchronous surfaces (§6).
    #[arg(long, env = "NETDEFEND_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "NETDEFEND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Path to the structured pipeline config (TOML). Defaults are used
    /// for anything not present in the file.
    #[arg(long, env = "NETDEFEND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the detection-ensemble artifact (weights + threshold).
    #[arg(long, env = "NETDEFEND_ENSEMBLE_ARTIFACT")]
    pub ensemble_artifact: Option<PathBuf>,

    /// Path to the policy-agent artifact. Absent means "always fall back
    /// to the rule table" (§4.C).
    #[arg(long, env = "NETDEFEND_AGENT_ARTIFACT")]
    pub agent_artifact: Option<PathBuf>,

    /// Bus backend: `inproc` (default) or `nats`.
    #[arg(long, env = "NETDEFEND_BUS", default_value = "inproc")]
    pub bus: String,

    /// NATS server URL, required when `--bus nats`.
    #[arg(long, env = "NETDEFEND_NATS_URL")]
    pub nats_url: Option<String>,

    /// Worker pool size per stage (§5).
    #[arg(long, env = "NETDEFEND_WORKERS", default_value = "4")]
    pub workers: usize,

    /// Log format: `json` or `text`.
    #[arg(long, env = "NETDEFEND_LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "NETDEFEND_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// A CIDR the orchestrator must never synthesize a narrower-scoped
    /// rule against (§4.B validation). Repeatable.
    #[arg(long = "protected-asset", env = "NETDEFEND_PROTECTED_ASSETS", value_delimiter = ',')]
    pub protected_assets: Vec<String>,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bus == "nats" && self.nats_url.is_none() {
            anyhow::bail!("--nats-url is required when --bus nats");
        }
        if !matches!(self.bus.as_str(), "inproc" | "nats") {
            anyhow::bail!("invalid --bus value: {} (expected inproc or nats)", self.bus);
        }
        if self.workers == 0 {
            anyhow::bail!("--workers must be at least 1");
        }
        Ok(())
    }

    /// Load the structured pipeline config, falling back to defaults if
    /// `--config` wasn't given.
    pub fn load_engine_config(&self) -> anyhow::Result<EngineConfig> {
        match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
                EngineConfig::from_toml_str(&text)
            }
            None => Ok(EngineConfig::default()),
        }
    }

    /// Parses `--protected-asset` entries into CIDRs, skipping (and
    /// logging) any that don't parse rather than failing startup over a
    /// typo in an operator-supplied list.
    pub fn protected_assets(&self) -> Vec<Cidr> {
        self.protected_assets
            .iter()
            .filter_map(|s| match crate::orchestrator::parse_cidr(s) {
                Some(cidr) => Some(cidr),
                None => {
                    tracing::warn!(value = %s, "ignoring unparseable --protected-asset");
                    None
                }
            })
            .collect()
    }
}

/// Initialize tracing/logging from config. Uses `try_init` so it's safe
/// to call multiple times (e.g. from tests).
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
