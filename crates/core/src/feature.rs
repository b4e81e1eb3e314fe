// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-length feature vector emitted by window closure and consumed by
//! the detection ensemble (§3 "FeatureVector", §6 "FeatureVector contract").

use serde::{Deserialize, Serialize};

use crate::ids::FeatureVectorId;
use crate::window::{Window, WindowKey};

/// `(name, range, meaning)` documentation for each slot, in emission
/// order. A change in length or order here is the breaking change §6
/// calls out — bump [`FEATURE_VECTOR_VERSION`] alongside it.
pub const FEATURE_SLOTS: &[(&str, &str, &str)] = &[
    ("record_count_norm", "[0,1]", "window record count, log-compressed and clamped"),
    ("byte_mean_norm", "[0,1]", "mean bytes/record, log-compressed and clamped"),
    ("byte_variance_norm", "[0,1]", "byte-count variance, log-compressed and clamped"),
    ("packet_mean_norm", "[0,1]", "mean packets/record, log-compressed and clamped"),
    ("dst_port_entropy_norm", "[0,1]", "destination port entropy / max observed entropy"),
    ("syn_ack_ratio", "[0,1]", "SYN/ACK ratio, clamped"),
    ("rst_ratio", "[0,1]", "RST count / record count, clamped"),
    ("fin_ratio", "[0,1]", "FIN count / record count, clamped"),
    ("tcp_fraction", "[0,1]", "fraction of records that were TCP"),
    ("udp_fraction", "[0,1]", "fraction of records that were UDP"),
];

pub const FEATURE_VECTOR_VERSION: u32 = 1;

/// Identifiers retained purely for traceback (§3: "opaque context blob
/// with identifiers for traceback").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureContext {
    pub window_key: WindowKey,
    pub window_start_ms: i64,
    pub window_end_ms: i64,
}

/// Fixed-length ordered vector of floats, immutable once emitted (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub id: FeatureVectorId,
    pub version: u32,
    pub slots: Vec<f64>,
    pub context: FeatureContext,
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

fn log_compress(x: f64, scale: f64) -> f64 {
    clamp01((1.0 + x).ln() / scale)
}

impl FeatureVector {
    /// Materialize a vector from a closed window (§4.E step 4).
    pub fn from_window(window: &Window) -> Self {
        let agg = &window.aggregates;
        let record_count = agg.record_count.max(1) as f64;
        let max_entropy = (agg.dst_port_entropy.distinct_count().max(1) as f64).log2().max(1.0);

        let slots = vec![
            log_compress(agg.record_count as f64, 10.0),
            log_compress(agg.byte_moments.mean, 14.0),
            log_compress(agg.byte_moments.variance(), 20.0),
            log_compress(agg.packet_moments.mean, 10.0),
            clamp01(agg.dst_port_entropy.entropy_bits() / max_entropy),
            agg.syn_ack_ratio(),
            clamp01(agg.rst_count as f64 / record_count),
            clamp01(agg.fin_count as f64 / record_count),
            clamp01(agg.tcp_count as f64 / record_count),
            clamp01(agg.udp_count as f64 / record_count),
        ];

        Self {
            id: FeatureVectorId::new(),
            version: FEATURE_VECTOR_VERSION,
            slots,
            context: FeatureContext {
                window_key: window.key.clone(),
                window_start_ms: window.start_ms,
                window_end_ms: window.end_ms,
            },
        }
    }

    pub fn slot(&self, name: &str) -> Option<f64> {
        FEATURE_SLOTS.iter().position(|(n, ..)| *n == name).and_then(|i| self.slots.get(i).copied())
    }

    /// The slot name at a given index, for detectors that attribute a
    /// score to specific features (§4.H contributions).
    pub fn slot_name(index: usize) -> Option<&'static str> {
        FEATURE_SLOTS.get(index).map(|(name, ..)| *name)
    }
}

#[cfg(test)]
#[path = "feature_tests.rs"]
mod tests;
