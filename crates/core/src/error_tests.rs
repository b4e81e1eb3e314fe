// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn adapter_outcome_wire_values_are_stable() {
    assert_eq!(AdapterOutcome::Ok.as_str(), "OK");
    assert_eq!(AdapterOutcome::Transient.as_str(), "TRANSIENT");
    assert_eq!(AdapterOutcome::Permanent.as_str(), "PERMANENT");
    assert_eq!(AdapterOutcome::Unreachable.as_str(), "UNREACHABLE");
}

#[test]
fn only_transient_is_retryable() {
    assert!(AdapterOutcome::Transient.is_retryable());
    assert!(!AdapterOutcome::Ok.is_retryable());
    assert!(!AdapterOutcome::Permanent.is_retryable());
    assert!(!AdapterOutcome::Unreachable.is_retryable());
}

#[test]
fn parse_error_reason_display_matches_wire_string() {
    assert_eq!(ParseErrorReason::TruncatedHeader.to_string(), "truncated_header");
}

#[test]
fn agent_error_display_includes_reason() {
    let err = AgentError { reason: "slot mismatch".to_string() };
    assert_eq!(err.to_string(), "policy agent failed: slot mismatch");
}
