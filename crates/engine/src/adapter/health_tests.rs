// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use netdefend_core::ids::RuleId;
use netdefend_core::rule::UniversalRule;

use super::*;
use crate::orchestrator::adapter::AdapterApplyResult;

type Fut<'a, O> = std::pin::Pin<Box<dyn std::future::Future<Output = O> + Send + 'a>>;

struct FakeAdapter {
    paused: AtomicBool,
    probe_outcome: AdapterOutcome,
}

impl RuleAdapter for FakeAdapter {
    fn id(&self) -> &str {
        "fake"
    }

    fn apply<'a>(&'a self, _rule: &'a UniversalRule) -> Fut<'a, AdapterApplyResult> {
        Box::pin(async { AdapterApplyResult { outcome: AdapterOutcome::Ok, per_rule_id: None } })
    }

    fn remove<'a>(&'a self, _rule_id: &'a RuleId, _per_rule_id: Option<&'a str>) -> Fut<'a, AdapterOutcome> {
        Box::pin(async { AdapterOutcome::Ok })
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    fn probe<'a>(&'a self) -> Fut<'a, AdapterOutcome> {
        Box::pin(async move { self.probe_outcome })
    }
}

#[tokio::test]
async fn a_healthy_probe_resumes_a_paused_adapter() {
    let adapter: Arc<dyn RuleAdapter> =
        Arc::new(FakeAdapter { paused: AtomicBool::new(true), probe_outcome: AdapterOutcome::Ok });
    let shutdown = CancellationToken::new();
    spawn_health_checker(vec![adapter.clone()], shutdown.clone(), Duration::from_millis(5));

    tokio::time::sleep(Duration::from_millis(40)).await;
    shutdown.cancel();

    assert!(!adapter.is_paused());
}

#[tokio::test]
async fn an_unhealthy_probe_leaves_the_adapter_paused() {
    let adapter: Arc<dyn RuleAdapter> =
        Arc::new(FakeAdapter { paused: AtomicBool::new(true), probe_outcome: AdapterOutcome::Unreachable });
    let shutdown = CancellationToken::new();
    spawn_health_checker(vec![adapter.clone()], shutdown.clone(), Duration::from_millis(5));

    tokio::time::sleep(Duration::from_millis(40)).await;
    shutdown.cancel();

    assert!(adapter.is_paused());
}
