// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable error/outcome taxonomies shared across stages (§7 of the spec).
//!
//! These are plain enums with hand-written `as_str`/`Display`, the same
//! shape as the transport-facing `ErrorCode` in the teacher's codebase:
//! a small fixed set of variants doesn't need a derive macro, and the
//! wire string is part of the contract so it's spelled out explicitly
//! rather than derived from the variant name.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why F dropped a record before it became a `CommonRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseErrorReason {
    TruncatedHeader,
    UnknownFraming,
    BadFieldEncoding,
    ZeroLengthRecord,
    ProtocolMismatch,
}

impl ParseErrorReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TruncatedHeader => "truncated_header",
            Self::UnknownFraming => "unknown_framing",
            Self::BadFieldEncoding => "bad_field_encoding",
            Self::ZeroLengthRecord => "zero_length_record",
            Self::ProtocolMismatch => "protocol_mismatch",
        }
    }
}

impl fmt::Display for ParseErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detector's failure to produce a verdict (§4.D).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorError {
    pub detector_id: String,
    pub reason: String,
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "detector {} failed: {}", self.detector_id, self.reason)
    }
}

/// The policy agent's learned mapping failed to produce an action for a
/// state vector (§4.C); the agent falls back to the rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentError {
    pub reason: String,
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "policy agent failed: {}", self.reason)
    }
}

/// Why the orchestrator rejected a candidate rule (§4.B).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    ProtectedAsset { asset: String },
    ScopeTooBroad { max_bits: u8, requested_bits: u8 },
    ContradictsAllowList { rule_id_hint: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtectedAsset { asset } => write!(f, "target {asset} is a protected asset"),
            Self::ScopeTooBroad { max_bits, requested_bits } => write!(
                f,
                "requested scope /{requested_bits} broader than max allowed /{max_bits}"
            ),
            Self::ContradictsAllowList { rule_id_hint } => {
                write!(f, "contradicts pinned allow-list entry {rule_id_hint}")
            }
        }
    }
}

/// Stable wire values for adapter outcomes (§6 "Adapter outcome codes").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterOutcome {
    Ok,
    Transient,
    Permanent,
    Unreachable,
}

impl AdapterOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Transient => "TRANSIENT",
            Self::Permanent => "PERMANENT",
            Self::Unreachable => "UNREACHABLE",
        }
    }

    /// Whether this outcome warrants a retry per the adapter retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }
}

impl fmt::Display for AdapterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
