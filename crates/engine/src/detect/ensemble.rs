// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Combines N detector verdicts into one `Detection` (§4.D). The detector
//! set and their combination weights live behind an [`ArtifactHandle`] so
//! a hot reload swaps them atomically with no partial-reload state.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use netdefend_core::detection::{AggregateLabel, Detection};
use netdefend_core::feature::FeatureVector;
use netdefend_core::ids::DetectionId;
use tracing::warn;

use super::detector::Detector;
use super::stats::DetectionStats;

/// One immutable, internally-consistent detector set + weights snapshot.
pub struct EnsembleRuntime {
    detectors: Vec<Box<dyn Detector>>,
    weights: HashMap<String, f64>,
    threshold: f64,
}

impl EnsembleRuntime {
    pub fn new(detectors: Vec<Box<dyn Detector>>, weights: HashMap<String, f64>, threshold: f64) -> Self {
        Self { detectors, weights, threshold }
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }
}

pub struct Ensemble {
    runtime: Arc<netdefend_core::artifact::ArtifactHandle<EnsembleRuntime>>,
    predict_budget: Duration,
    stats: Arc<DetectionStats>,
}

impl Ensemble {
    pub fn new(
        runtime: Arc<netdefend_core::artifact::ArtifactHandle<EnsembleRuntime>>,
        predict_budget: Duration,
        stats: Arc<DetectionStats>,
    ) -> Self {
        Self { runtime, predict_budget, stats }
    }

    pub fn stats(&self) -> Arc<DetectionStats> {
        Arc::clone(&self.stats)
    }

    /// Run every detector against `fv` within `predict_budget` each,
    /// combine the survivors, and emit exactly one `Detection` (§4.D,
    /// §8 property 3).
    pub async fn detect(&self, fv: &FeatureVector, now_ms: i64) -> Detection {
        let runtime = self.runtime.load();
        let mut verdicts = Vec::with_capacity(runtime.detectors.len());
        let mut failed = Vec::new();

        for detector in &runtime.detectors {
            match tokio::time::timeout(self.predict_budget, detector.predict(fv)).await {
                Ok(Ok(verdict)) => verdicts.push(verdict),
                Ok(Err(err)) => {
                    warn!(detector = %err, "detector returned an error, redistributing its weight");
                    failed.push(detector.id().to_string());
                    self.stats.detector_failures.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {
                    warn!(detector = detector.id(), "detector prediction timed out, redistributing its weight");
                    failed.push(detector.id().to_string());
                    self.stats.detector_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        let detection = Self::combine(&runtime, fv, verdicts, failed, now_ms);

        self.stats.detections_emitted.fetch_add(1, Ordering::Relaxed);
        match detection.aggregate_label {
            AggregateLabel::Threat => self.stats.threat_count.fetch_add(1, Ordering::Relaxed),
            AggregateLabel::Benign => self.stats.benign_count.fetch_add(1, Ordering::Relaxed),
            AggregateLabel::Unknown => self.stats.unknown_count.fetch_add(1, Ordering::Relaxed),
        };
        detection
    }

    fn combine(
        runtime: &EnsembleRuntime,
        fv: &FeatureVector,
        verdicts: Vec<netdefend_core::verdict::DetectorVerdict>,
        failed: Vec<String>,
        now_ms: i64,
    ) -> Detection {
        if verdicts.is_empty() {
            return Detection {
                detection_id: DetectionId::new(),
                feature_vector_ref: fv.id,
                verdicts,
                aggregate_score: f64::NAN,
                aggregate_label: AggregateLabel::Unknown,
                decided_at: now_ms,
                failed_detectors: failed,
            };
        }

        // Proportional redistribution: renormalize the surviving
        // detectors' weights so they sum back to 1 (§4.D).
        let surviving_weight: f64 = verdicts.iter().map(|v| runtime.weights.get(&v.detector_id).copied().unwrap_or(0.0)).sum();
        let score = if surviving_weight > 0.0 {
            verdicts
                .iter()
                .map(|v| (runtime.weights.get(&v.detector_id).copied().unwrap_or(0.0) / surviving_weight) * v.score)
                .sum()
        } else {
            verdicts.iter().map(|v| v.score).sum::<f64>() / verdicts.len() as f64
        };

        let label = if score >= runtime.threshold { AggregateLabel::Threat } else { AggregateLabel::Benign };

        Detection {
            detection_id: DetectionId::new(),
            feature_vector_ref: fv.id,
            verdicts,
            aggregate_score: score,
            aggregate_label: label,
            decided_at: now_ms,
            failed_detectors: failed,
        }
    }
}

#[cfg(test)]
#[path = "ensemble_tests.rs"]
mod tests;
