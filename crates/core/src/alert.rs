// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification record published to alert sinks (§4.I).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decision::Action;
use crate::ids::{DecisionId, RuleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// `deny|quarantine → high/critical`, `rate_limit → medium`,
    /// everything else `→ low` (§4.I).
    pub fn for_action(action: Action) -> Self {
        match action {
            Action::Deny => Self::High,
            Action::Quarantine(_) => Self::Critical,
            Action::RateLimit(_) => Self::Medium,
            Action::Allow | Action::Monitor => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single notification, already past dedup (§4.I). `key` is the
/// dedup key it was published under, kept for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub decision_ref: DecisionId,
    pub rule_ref: Option<RuleId>,
    pub severity: Severity,
    pub summary: String,
    pub dedup_key: String,
    pub created_at: i64,
}

#[cfg(test)]
#[path = "alert_tests.rs"]
mod tests;
