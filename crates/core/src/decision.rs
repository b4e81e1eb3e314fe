// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Policy agent output (§3 "Decision", §4.C) and the exhaustive action set
//! (§6 "Action set").

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{DecisionId, DetectionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateLimitTier {
    Low,
    Med,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuarantineDuration {
    Short,
    Long,
}

/// The exhaustive 8-action set (§6, §9 resolved ambiguity: the spec fixes
/// this 8-action set and treats any 5-action list in upstream material as
/// a projection of it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Allow,
    Deny,
    RateLimit(RateLimitTier),
    Quarantine(QuarantineDuration),
    Monitor,
}

impl Action {
    /// The exhaustive action set, in the fixed slot order the policy
    /// agent's learned artifact scores against (§4.C).
    pub const ALL: [Action; 8] = [
        Action::Allow,
        Action::Deny,
        Action::RateLimit(RateLimitTier::Low),
        Action::RateLimit(RateLimitTier::Med),
        Action::RateLimit(RateLimitTier::High),
        Action::Quarantine(QuarantineDuration::Short),
        Action::Quarantine(QuarantineDuration::Long),
        Action::Monitor,
    ];

    /// Stable wire tag, independent of any enclosed tier/duration.
    pub fn family(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::RateLimit(_) => "rate_limit",
            Self::Quarantine(_) => "quarantine",
            Self::Monitor => "monitor",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimit(tier) => write!(f, "rate_limit({tier:?})"),
            Self::Quarantine(dur) => write!(f, "quarantine({dur:?})"),
            other => write!(f, "{}", other.family()),
        }
    }
}

/// Extra parameters an action carries beyond its family (e.g. a
/// rate-limit cap in packets/sec), populated by the agent from Detection
/// context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionParameters {
    pub rate_limit_pps: Option<u32>,
}

/// `(decision_id, detection_ref, action, parameters, confidence,
/// agent_id, decided_at)`, immutable (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub decision_id: DecisionId,
    pub detection_ref: DetectionId,
    pub action: Action,
    pub parameters: ActionParameters,
    pub confidence: f64,
    pub agent_id: String,
    pub decided_at: i64,
}
