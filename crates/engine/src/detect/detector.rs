// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heterogeneous detector implementations (§4.D: "supervised classifier,
//! sequence model, anomaly scorer, reconstruction scorer"). Each is a
//! pure function of a `FeatureVector` and its artifact-warm-started
//! parameters — no detector mutates itself between calls.

use std::future::Future;
use std::pin::Pin;

use netdefend_core::error::DetectorError;
use netdefend_core::feature::FeatureVector;
use netdefend_core::verdict::{Contribution, DetectorVerdict, VerdictLabel};

type DetectFuture<'a, O> = Pin<Box<dyn Future<Output = O> + Send + 'a>>;

/// Object-safe async prediction contract, same shape as [`crate::bus::Bus`].
pub trait Detector: Send + Sync {
    fn id(&self) -> &str;

    fn predict<'a>(&'a self, fv: &'a FeatureVector) -> DetectFuture<'a, Result<DetectorVerdict, DetectorError>>;
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn length_mismatch(detector_id: &str, expected: usize, got: usize) -> DetectorError {
    DetectorError {
        detector_id: detector_id.to_string(),
        reason: format!("expected {expected} feature slots, got {got}"),
    }
}

/// Linear model over the raw feature slots, squashed through a sigmoid.
/// Supplies per-slot contributions so H can attribute a threat score to
/// specific features.
pub struct SupervisedClassifier {
    id: String,
    weights: Vec<f64>,
    bias: f64,
}

impl SupervisedClassifier {
    pub fn new(id: String, weights: Vec<f64>, bias: f64) -> Self {
        Self { id, weights, bias }
    }
}

impl Detector for SupervisedClassifier {
    fn id(&self) -> &str {
        &self.id
    }

    fn predict<'a>(&'a self, fv: &'a FeatureVector) -> DetectFuture<'a, Result<DetectorVerdict, DetectorError>> {
        Box::pin(async move {
            if fv.slots.len() != self.weights.len() {
                return Err(length_mismatch(&self.id, self.weights.len(), fv.slots.len()));
            }
            let contributions: Vec<Contribution> = fv
                .slots
                .iter()
                .zip(&self.weights)
                .enumerate()
                .map(|(i, (slot, weight))| Contribution {
                    feature_name: FeatureVector::slot_name(i).unwrap_or("unknown").to_string(),
                    weight: slot * weight,
                })
                .collect();
            let logit: f64 = contributions.iter().map(|c| c.weight).sum::<f64>() + self.bias;
            let score = sigmoid(logit);
            Ok(DetectorVerdict {
                detector_id: self.id.clone(),
                score,
                label: if score >= 0.5 { VerdictLabel::Threat } else { VerdictLabel::Benign },
                confidence: (score - 0.5).abs() * 2.0,
                contributions,
            })
        })
    }
}

/// Distance of the incoming vector from a learned "normal burst" baseline
/// — a cheap stand-in for a temporal/sequence model: it reacts to the
/// *shape* of the window's aggregates rather than any single slot.
pub struct SequenceModel {
    id: String,
    baseline: Vec<f64>,
    sensitivity: f64,
}

impl SequenceModel {
    pub fn new(id: String, baseline: Vec<f64>, sensitivity: f64) -> Self {
        Self { id, baseline, sensitivity }
    }
}

impl Detector for SequenceModel {
    fn id(&self) -> &str {
        &self.id
    }

    fn predict<'a>(&'a self, fv: &'a FeatureVector) -> DetectFuture<'a, Result<DetectorVerdict, DetectorError>> {
        Box::pin(async move {
            if fv.slots.len() != self.baseline.len() {
                return Err(length_mismatch(&self.id, self.baseline.len(), fv.slots.len()));
            }
            let sum_sq: f64 = fv.slots.iter().zip(&self.baseline).map(|(a, b)| (a - b).powi(2)).sum();
            let distance = sum_sq.sqrt() / (fv.slots.len() as f64).sqrt();
            let score = (distance * self.sensitivity).clamp(0.0, 1.0);
            Ok(DetectorVerdict {
                detector_id: self.id.clone(),
                score,
                label: if score >= 0.5 { VerdictLabel::Threat } else { VerdictLabel::Benign },
                confidence: score,
                contributions: Vec::new(),
            })
        })
    }
}

/// Per-slot z-score against a learned mean/std, averaged and squashed.
pub struct AnomalyScorer {
    id: String,
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl AnomalyScorer {
    pub fn new(id: String, mean: Vec<f64>, std: Vec<f64>) -> Self {
        Self { id, mean, std }
    }
}

impl Detector for AnomalyScorer {
    fn id(&self) -> &str {
        &self.id
    }

    fn predict<'a>(&'a self, fv: &'a FeatureVector) -> DetectFuture<'a, Result<DetectorVerdict, DetectorError>> {
        Box::pin(async move {
            if fv.slots.len() != self.mean.len() || fv.slots.len() != self.std.len() {
                return Err(length_mismatch(&self.id, self.mean.len(), fv.slots.len()));
            }
            let n = fv.slots.len().max(1) as f64;
            let avg_z: f64 = fv
                .slots
                .iter()
                .zip(&self.mean)
                .zip(&self.std)
                .map(|((x, mean), std)| {
                    let std = std.max(1e-6);
                    ((x - mean) / std).abs()
                })
                .sum::<f64>()
                / n;
            // Three standard deviations of average absolute z-score maps
            // to a saturated score of 1.0.
            let score = (avg_z / 3.0).clamp(0.0, 1.0);
            Ok(DetectorVerdict {
                detector_id: self.id.clone(),
                score,
                label: if score >= 0.5 { VerdictLabel::Threat } else { VerdictLabel::Benign },
                confidence: score,
                contributions: Vec::new(),
            })
        })
    }
}

/// Linear-autoencoder-style reconstruction error: project the slots down
/// through `projection` and back up through its transpose, score on the
/// residual norm.
pub struct ReconstructionScorer {
    id: String,
    projection: Vec<Vec<f64>>,
}

impl ReconstructionScorer {
    pub fn new(id: String, projection: Vec<Vec<f64>>) -> Self {
        Self { id, projection }
    }

    fn expected_len(&self) -> usize {
        self.projection.first().map(|row| row.len()).unwrap_or(0)
    }
}

impl Detector for ReconstructionScorer {
    fn id(&self) -> &str {
        &self.id
    }

    fn predict<'a>(&'a self, fv: &'a FeatureVector) -> DetectFuture<'a, Result<DetectorVerdict, DetectorError>> {
        Box::pin(async move {
            let expected = self.expected_len();
            if fv.slots.len() != expected || expected == 0 {
                return Err(length_mismatch(&self.id, expected, fv.slots.len()));
            }
            let latent: Vec<f64> = self
                .projection
                .iter()
                .map(|row| row.iter().zip(&fv.slots).map(|(w, x)| w * x).sum::<f64>())
                .collect();
            let reconstructed: Vec<f64> = (0..fv.slots.len())
                .map(|j| self.projection.iter().zip(&latent).map(|(row, z)| row[j] * z).sum::<f64>())
                .collect();
            let residual: f64 = fv
                .slots
                .iter()
                .zip(&reconstructed)
                .map(|(x, r)| (x - r).powi(2))
                .sum::<f64>()
                .sqrt();
            let score = (residual / (fv.slots.len() as f64).sqrt()).clamp(0.0, 1.0);
            Ok(DetectorVerdict {
                detector_id: self.id.clone(),
                score,
                label: if score >= 0.5 { VerdictLabel::Threat } else { VerdictLabel::Benign },
                confidence: score,
                contributions: Vec::new(),
            })
        })
    }
}

#[cfg(test)]
#[path = "detector_tests.rs"]
mod tests;
