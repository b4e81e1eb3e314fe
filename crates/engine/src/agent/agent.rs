// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps a Detection plus context to a Decision (§4.C): tries the learned
//! artifact first, falls back to the rule table if the artifact is
//! absent or errors.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use netdefend_core::artifact::ArtifactHandle;
use netdefend_core::config::AgentConfig;
use netdefend_core::decision::{ActionParameters, Decision};
use netdefend_core::detection::Detection;
use netdefend_core::ids::DecisionId;
use netdefend_core::state::{AgentContext, AgentStateVector};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::artifact::AgentRuntime;
use super::fallback;
use super::stats::AgentStats;

pub struct Agent {
    runtime: Option<Arc<ArtifactHandle<AgentRuntime>>>,
    config: AgentConfig,
    stats: Arc<AgentStats>,
    agent_id: String,
}

impl Agent {
    pub fn new(
        runtime: Option<Arc<ArtifactHandle<AgentRuntime>>>,
        config: AgentConfig,
        stats: Arc<AgentStats>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self { runtime, config, stats, agent_id: agent_id.into() }
    }

    pub fn stats(&self) -> Arc<AgentStats> {
        Arc::clone(&self.stats)
    }

    /// Builds the state vector, scores it, and emits a Decision — or
    /// returns `None` promptly if `cancel` fires first (§4.C
    /// "Cancellation").
    pub async fn decide(
        &self,
        detection: &Detection,
        context: &AgentContext,
        cancel: &CancellationToken,
        now_ms: i64,
    ) -> Option<Decision> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
                None
            }
            decision = self.compute(detection, context, now_ms) => Some(decision),
        }
    }

    async fn compute(&self, detection: &Detection, context: &AgentContext, now_ms: i64) -> Decision {
        let state = AgentStateVector::build(detection, context);

        let (action, confidence) = match &self.runtime {
            Some(handle) => match handle.load().predict(&state) {
                Ok(result) => {
                    self.stats.learned_used.fetch_add(1, Ordering::Relaxed);
                    result
                }
                Err(err) => {
                    warn!(error = %err, "policy agent errored, falling back to rule table");
                    self.stats.agent_errors.fetch_add(1, Ordering::Relaxed);
                    self.stats.fallback_used.fetch_add(1, Ordering::Relaxed);
                    fallback::decide(detection, &self.config)
                }
            },
            None => {
                self.stats.fallback_used.fetch_add(1, Ordering::Relaxed);
                fallback::decide(detection, &self.config)
            }
        };

        self.stats.decisions_emitted.fetch_add(1, Ordering::Relaxed);
        Decision {
            decision_id: DecisionId::new(),
            detection_ref: detection.detection_id,
            action,
            parameters: ActionParameters::default(),
            confidence,
            agent_id: self.agent_id.clone(),
            decided_at: now_ms,
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
