// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;

use netdefend_core::decision::{Action, ActionParameters};
use netdefend_core::ids::{DecisionId, DetectionId};
use netdefend_core::rule::{Cidr, RuleAction, RuleMatch};

use super::*;

struct RecordingSink {
    count: AtomicUsize,
}

impl AlertSink for RecordingSink {
    fn id(&self) -> &str {
        "recording"
    }

    fn publish<'a>(
        &'a self,
        _alert: &'a Alert,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), super::sink::SinkError>> + Send + 'a>> {
        self.count.fetch_add(1, AtomicOrdering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}

struct FailingSink;

impl AlertSink for FailingSink {
    fn id(&self) -> &str {
        "failing"
    }

    fn publish<'a>(
        &'a self,
        _alert: &'a Alert,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), super::sink::SinkError>> + Send + 'a>> {
        Box::pin(async { Err(super::sink::SinkError { reason: "unreachable".to_string() }) })
    }
}

fn decision(action: Action) -> Decision {
    Decision {
        decision_id: DecisionId::new(),
        detection_ref: DetectionId::new(),
        action,
        parameters: ActionParameters::default(),
        confidence: 0.9,
        agent_id: "agent-1".to_string(),
        decided_at: 0,
    }
}

fn rule() -> UniversalRule {
    UniversalRule {
        rule_id: netdefend_core::ids::RuleId::new(),
        rule_match: RuleMatch {
            src_cidr: Some(Cidr::host(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)))),
            ..Default::default()
        },
        action: RuleAction::Deny,
        priority: 10,
        ttl_ms: None,
        origin_decision_ref: DecisionId::new(),
        created_at: 0,
    }
}

#[tokio::test]
async fn a_fresh_decision_publishes_to_every_sink() {
    let sink = Arc::new(RecordingSink { count: AtomicUsize::new(0) });
    let alerter = Arc::new(Alerter::new(vec![sink.clone()], 300_000));

    let alert = alerter.notify(&decision(Action::Deny), Some(&rule()), 0);
    assert!(alert.is_some());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(sink.count.load(AtomicOrdering::SeqCst), 1);
    assert_eq!(alerter.stats().snapshot().published, 1);
}

#[tokio::test]
async fn the_same_key_within_the_window_is_deduped() {
    let sink = Arc::new(RecordingSink { count: AtomicUsize::new(0) });
    let alerter = Arc::new(Alerter::new(vec![sink.clone()], 300_000));

    assert!(alerter.notify(&decision(Action::Deny), Some(&rule()), 0).is_some());
    assert!(alerter.notify(&decision(Action::Deny), Some(&rule()), 1_000).is_none());
    assert_eq!(alerter.stats().snapshot().deduped, 1);
}

#[tokio::test]
async fn a_key_outside_the_window_publishes_again() {
    let sink = Arc::new(RecordingSink { count: AtomicUsize::new(0) });
    let alerter = Arc::new(Alerter::new(vec![sink.clone()], 1_000));

    assert!(alerter.notify(&decision(Action::Deny), Some(&rule()), 0).is_some());
    assert!(alerter.notify(&decision(Action::Deny), Some(&rule()), 5_000).is_some());
}

#[tokio::test]
async fn a_failing_sink_is_counted_but_does_not_prevent_other_sinks() {
    let sink = Arc::new(RecordingSink { count: AtomicUsize::new(0) });
    let alerter = Arc::new(Alerter::new(vec![Arc::new(FailingSink), sink.clone()], 300_000));

    alerter.notify(&decision(Action::Monitor), None, 0);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(sink.count.load(AtomicOrdering::SeqCst), 1);
    let snapshot = alerter.stats().snapshot();
    assert_eq!(snapshot.published, 1);
    assert_eq!(snapshot.sink_failures, 1);
}

#[test]
fn prune_expired_drops_stale_dedup_entries() {
    let alerter = Alerter::new(Vec::new(), 1_000);
    alerter.dedup.lock().insert("k".to_string(), 0);
    alerter.prune_expired(5_000);
    assert!(alerter.dedup.lock().is_empty());
}
