// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk ensemble artifact format (§4.D: "weights and a decision
//! threshold loaded from artifact metadata") plus the watcher that
//! hot-reloads it (§9 "Artifact lifecycle").

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use netdefend_core::artifact::ArtifactHandle;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::hotreload::FileWatcher;

use super::detector::{AnomalyScorer, Detector, ReconstructionScorer, SequenceModel, SupervisedClassifier};
use super::ensemble::EnsembleRuntime;

/// Per-detector parameters, warm-started from the artifact so each
/// detector's `predict` stays a pure function of the feature vector
/// (§4.D: "any internal state must be explicitly warm-started from the
/// artifact").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectorParams {
    Supervised { weights: Vec<f64>, bias: f64 },
    Sequence { baseline: Vec<f64>, sensitivity: f64 },
    Anomaly { mean: Vec<f64>, std: Vec<f64> },
    Reconstruction { projection: Vec<Vec<f64>> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorArtifactEntry {
    pub detector_id: String,
    pub weight: f64,
    pub params: DetectorParams,
}

/// The full on-disk artifact: N heterogeneous detectors plus the
/// combination threshold (§4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleArtifact {
    pub detectors: Vec<DetectorArtifactEntry>,
    pub threshold: f64,
}

impl EnsembleArtifact {
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading ensemble artifact {}: {e}", path.display()))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// A small, always-available default so the ensemble is never empty
    /// absent an operator-supplied artifact (§4.D's "idle" start state
    /// still has to score something).
    pub fn default_for_slot_count(slots: usize) -> Self {
        let even_weight = 1.0 / 4.0;
        Self {
            threshold: 0.6,
            detectors: vec![
                DetectorArtifactEntry {
                    detector_id: "supervised".to_string(),
                    weight: even_weight,
                    params: DetectorParams::Supervised { weights: vec![0.3; slots], bias: -1.0 },
                },
                DetectorArtifactEntry {
                    detector_id: "sequence".to_string(),
                    weight: even_weight,
                    params: DetectorParams::Sequence { baseline: vec![0.2; slots], sensitivity: 1.5 },
                },
                DetectorArtifactEntry {
                    detector_id: "anomaly".to_string(),
                    weight: even_weight,
                    params: DetectorParams::Anomaly { mean: vec![0.2; slots], std: vec![0.15; slots] },
                },
                DetectorArtifactEntry {
                    detector_id: "reconstruction".to_string(),
                    weight: even_weight,
                    params: DetectorParams::Reconstruction { projection: default_projection(slots) },
                },
            ],
        }
    }
}

/// Applies config-level overrides (§6: "sourced from artifact metadata
/// unless overridden") on top of a loaded artifact, in place.
pub fn apply_overrides(artifact: &mut EnsembleArtifact, overrides: &netdefend_core::config::EnsembleOverrides) {
    if let Some(weights) = &overrides.weights {
        for entry in &mut artifact.detectors {
            if let Some(&w) = weights.get(&entry.detector_id) {
                entry.weight = w;
            }
        }
    }
    if let Some(threshold) = overrides.threshold {
        artifact.threshold = threshold;
    }
}

fn default_projection(slots: usize) -> Vec<Vec<f64>> {
    let k = (slots / 2).max(1);
    (0..k)
        .map(|i| {
            (0..slots)
                .map(|j| if j % k == i { 1.0 / (k as f64).sqrt() } else { 0.0 })
                .collect()
        })
        .collect()
}

/// Builds the concrete detector set and per-detector combination weights
/// from one artifact snapshot.
pub fn build_runtime(artifact: &EnsembleArtifact) -> EnsembleRuntime {
    let mut detectors: Vec<Box<dyn Detector>> = Vec::with_capacity(artifact.detectors.len());
    let mut weights = std::collections::HashMap::new();

    for entry in &artifact.detectors {
        weights.insert(entry.detector_id.clone(), entry.weight);
        let detector: Box<dyn Detector> = match &entry.params {
            DetectorParams::Supervised { weights, bias } => {
                Box::new(SupervisedClassifier::new(entry.detector_id.clone(), weights.clone(), *bias))
            }
            DetectorParams::Sequence { baseline, sensitivity } => {
                Box::new(SequenceModel::new(entry.detector_id.clone(), baseline.clone(), *sensitivity))
            }
            DetectorParams::Anomaly { mean, std } => {
                Box::new(AnomalyScorer::new(entry.detector_id.clone(), mean.clone(), std.clone()))
            }
            DetectorParams::Reconstruction { projection } => {
                Box::new(ReconstructionScorer::new(entry.detector_id.clone(), projection.clone()))
            }
        };
        detectors.push(detector);
    }

    EnsembleRuntime::new(detectors, weights, artifact.threshold)
}

/// Watches an ensemble artifact file and keeps an [`ArtifactHandle`]
/// current, on top of the shared [`FileWatcher`] loop.
pub struct ArtifactWatcher {
    path: PathBuf,
    poll_interval: Duration,
}

impl ArtifactWatcher {
    pub fn new(path: PathBuf) -> Self {
        Self { path, poll_interval: Duration::from_secs(10) }
    }

    pub async fn run(self, handle: Arc<ArtifactHandle<EnsembleRuntime>>, shutdown: CancellationToken) {
        let watcher = FileWatcher::new(self.path).with_poll_interval(self.poll_interval);
        watcher
            .run(shutdown, move |path| match EnsembleArtifact::load_from_path(path) {
                Ok(artifact) => {
                    handle.store(build_runtime(&artifact));
                    info!(path = %path.display(), "reloaded ensemble artifact");
                }
                Err(err) => warn!(path = %path.display(), error = %err, "ensemble artifact reload failed, keeping prior snapshot"),
            })
            .await;
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
