// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newtype identifiers threaded through the detection/decision/enforcement
//! pipeline. Each wraps a [`uuid::Uuid`] so ids from different domains
//! (a `DetectionId` vs a `RuleId`) can't be swapped by accident at a call
//! site.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(DetectionId);
id_type!(DecisionId);
id_type!(RuleId);
id_type!(FeatureVectorId);

/// Identifies the collector/sensor that produced a raw record, used for
/// dedup keying alongside `flow_id`/`t_end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorId(pub String);

/// Per-collector flow identifier, opaque outside of the dedup cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(pub String);
