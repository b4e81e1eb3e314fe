// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk policy-agent artifact format (§4.C: "a learned policy loaded
//! from an artifact") plus the runtime it builds.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use netdefend_core::artifact::ArtifactHandle;
use netdefend_core::decision::Action;
use netdefend_core::error::AgentError;
use netdefend_core::state::AgentStateVector;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::hotreload::FileWatcher;

/// One action's row in the learned linear model: `logit = weights . state
/// + bias`, indexed in lockstep with [`Action::ALL`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionWeights {
    pub weights: Vec<f64>,
    pub bias: f64,
}

/// A softmax-over-linear-logits policy, warm-started from the artifact
/// (§4.C: "the mapping is deterministic given the artifact and the
/// input").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentArtifact {
    /// One entry per `Action::ALL` slot, same order.
    pub actions: Vec<ActionWeights>,
}

impl AgentArtifact {
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading agent artifact {}: {e}", path.display()))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// A small, always-available default so the agent has a mapping
    /// before any operator-supplied artifact lands: a mild preference
    /// for `monitor` and `allow`, tie-broken by `aggregate_score`.
    pub fn default_for_slot_count(slots: usize) -> Self {
        let bias_for = |action: &Action| match action {
            Action::Monitor => 0.5,
            Action::Allow => 0.3,
            _ => 0.0,
        };
        let actions = Action::ALL
            .iter()
            .map(|action| ActionWeights { weights: vec![0.0; slots], bias: bias_for(action) })
            .collect();
        Self { actions }
    }
}

/// One immutable weights snapshot, ready to score a state vector.
pub struct AgentRuntime {
    actions: Vec<ActionWeights>,
}

impl AgentRuntime {
    pub fn new(artifact: &AgentArtifact) -> Self {
        Self { actions: artifact.actions.clone() }
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Scores every action's logit, picks the arg-max under softmax, and
    /// returns its probability as confidence (§4.C: output is
    /// `(action, confidence)`).
    pub fn predict(&self, state: &AgentStateVector) -> Result<(Action, f64), AgentError> {
        if self.actions.len() != Action::ALL.len() {
            return Err(AgentError {
                reason: format!("artifact has {} action rows, expected {}", self.actions.len(), Action::ALL.len()),
            });
        }

        let logits: Vec<f64> = self
            .actions
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if row.weights.len() != state.slots.len() {
                    return Err(AgentError {
                        reason: format!(
                            "action {} weight row has {} slots, state has {}",
                            i,
                            row.weights.len(),
                            state.slots.len()
                        ),
                    });
                }
                Ok(row.weights.iter().zip(&state.slots).map(|(w, x)| w * x).sum::<f64>() + row.bias)
            })
            .collect::<Result<_, _>>()?;

        let max_logit = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max_logit).exp()).collect();
        let sum_exp: f64 = exps.iter().sum();

        let (best_idx, &best_exp) = exps
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| AgentError { reason: "empty action set".to_string() })?;

        let confidence = if sum_exp > 0.0 { best_exp / sum_exp } else { 0.0 };
        Ok((Action::ALL[best_idx], confidence))
    }
}

/// Watches an agent artifact file and keeps an [`ArtifactHandle`]
/// current, on top of the shared [`FileWatcher`] loop (§9 "Artifact
/// lifecycle", same hot-reload contract as the ensemble's).
pub struct ArtifactWatcher {
    path: PathBuf,
    poll_interval: Duration,
}

impl ArtifactWatcher {
    pub fn new(path: PathBuf) -> Self {
        Self { path, poll_interval: Duration::from_secs(10) }
    }

    pub async fn run(self, handle: Arc<ArtifactHandle<AgentRuntime>>, shutdown: CancellationToken) {
        let watcher = FileWatcher::new(self.path).with_poll_interval(self.poll_interval);
        watcher
            .run(shutdown, move |path| match AgentArtifact::load_from_path(path) {
                Ok(artifact) => {
                    handle.store(AgentRuntime::new(&artifact));
                    info!(path = %path.display(), "reloaded agent artifact");
                }
                Err(err) => warn!(path = %path.display(), error = %err, "agent artifact reload failed, keeping prior snapshot"),
            })
            .await;
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
