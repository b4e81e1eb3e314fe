// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_config_has_at_least_one_window_spec() {
    let cfg = EngineConfig::default();
    assert!(!cfg.feature_engine.windows.is_empty());
}

#[test]
fn parses_partial_toml_with_defaults_filled_in() {
    let toml_src = r#"
        [orchestrator]
        default_rate_limit_pps = 500
    "#;
    let cfg = EngineConfig::from_toml_str(toml_src).expect("valid toml");
    assert_eq!(cfg.orchestrator.default_rate_limit_pps, 500);
    assert!(!cfg.feature_engine.windows.is_empty());
}

#[test]
fn ttl_lookup_returns_none_for_allow_and_monitor() {
    let cfg = EngineConfig::default();
    assert!(cfg.ttl_for_action(Action::Allow).is_none());
    assert!(cfg.ttl_for_action(Action::Monitor).is_none());
    assert!(cfg.ttl_for_action(Action::Deny).is_some());
}
