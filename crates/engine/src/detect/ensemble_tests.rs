// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::time::Duration;

use netdefend_core::artifact::ArtifactHandle;
use netdefend_core::detection::AggregateLabel;
use netdefend_core::error::DetectorError;
use netdefend_core::feature::{FeatureContext, FeatureVector, FEATURE_SLOTS};
use netdefend_core::ids::FeatureVectorId;
use netdefend_core::verdict::{DetectorVerdict, VerdictLabel};
use netdefend_core::window::WindowKey;

use crate::detect::{detector, stats};

use super::*;

struct FixedDetector {
    id: String,
    score: f64,
    fail: bool,
}

impl detector::Detector for FixedDetector {
    fn id(&self) -> &str {
        &self.id
    }

    fn predict<'a>(
        &'a self,
        _fv: &'a FeatureVector,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<DetectorVerdict, DetectorError>> + Send + 'a>> {
        Box::pin(async move {
            if self.fail {
                return Err(DetectorError { detector_id: self.id.clone(), reason: "forced failure".into() });
            }
            Ok(DetectorVerdict {
                detector_id: self.id.clone(),
                score: self.score,
                label: if self.score >= 0.5 { VerdictLabel::Threat } else { VerdictLabel::Benign },
                confidence: 1.0,
                contributions: Vec::new(),
            })
        })
    }
}

fn fv() -> FeatureVector {
    FeatureVector {
        id: FeatureVectorId::new(),
        version: 1,
        slots: vec![0.0; FEATURE_SLOTS.len()],
        context: FeatureContext { window_key: WindowKey("k".into()), window_start_ms: 0, window_end_ms: 1_000 },
    }
}

fn ensemble_with(detectors: Vec<Box<dyn detector::Detector>>, weights: HashMap<String, f64>, threshold: f64) -> ensemble::Ensemble {
    let runtime = ensemble::EnsembleRuntime::new(detectors, weights, threshold);
    let handle = Arc::new(ArtifactHandle::new(runtime));
    ensemble::Ensemble::new(handle, Duration::from_millis(50), Arc::new(stats::DetectionStats::default()))
}

#[tokio::test]
async fn weighted_average_combines_surviving_detectors() {
    let detectors: Vec<Box<dyn detector::Detector>> = vec![
        Box::new(FixedDetector { id: "a".into(), score: 1.0, fail: false }),
        Box::new(FixedDetector { id: "b".into(), score: 0.0, fail: false }),
    ];
    let mut weights = HashMap::new();
    weights.insert("a".to_string(), 0.5);
    weights.insert("b".to_string(), 0.5);

    let ensemble = ensemble_with(detectors, weights, 0.4);
    let detection = ensemble.detect(&fv(), 0).await;

    assert!((detection.aggregate_score - 0.5).abs() < 1e-9);
    assert_eq!(detection.aggregate_label, AggregateLabel::Threat);
    assert!(detection.failed_detectors.is_empty());
}

#[tokio::test]
async fn failed_detector_weight_is_redistributed_to_survivors() {
    let detectors: Vec<Box<dyn detector::Detector>> = vec![
        Box::new(FixedDetector { id: "a".into(), score: 1.0, fail: false }),
        Box::new(FixedDetector { id: "b".into(), score: 0.0, fail: true }),
    ];
    let mut weights = HashMap::new();
    weights.insert("a".to_string(), 0.5);
    weights.insert("b".to_string(), 0.5);

    let ensemble = ensemble_with(detectors, weights, 0.9);
    let detection = ensemble.detect(&fv(), 0).await;

    // `a` alone now carries the full renormalized weight, so the score
    // is exactly its own, not diluted by `b`'s failure.
    assert!((detection.aggregate_score - 1.0).abs() < 1e-9);
    assert_eq!(detection.failed_detectors, vec!["b".to_string()]);
}

#[tokio::test]
async fn all_detectors_failing_yields_unknown_with_nan_score() {
    let detectors: Vec<Box<dyn detector::Detector>> = vec![Box::new(FixedDetector { id: "a".into(), score: 1.0, fail: true })];
    let mut weights = HashMap::new();
    weights.insert("a".to_string(), 1.0);

    let ensemble = ensemble_with(detectors, weights, 0.5);
    let detection = ensemble.detect(&fv(), 0).await;

    assert_eq!(detection.aggregate_label, AggregateLabel::Unknown);
    assert!(detection.aggregate_score.is_nan());
    assert!(detection.score_is_well_formed());
}
