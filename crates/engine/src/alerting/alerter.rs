// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Severity derivation, de-duplication and sink fan-out for §4.I: a
//! `Decision` plus the `UniversalRule` it produced (if any) comes in,
//! an [`Alert`] goes to every sink unless a matching key was already
//! published inside the dedup window.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use netdefend_core::alert::{Alert, Severity};
use netdefend_core::decision::Decision;
use netdefend_core::rule::UniversalRule;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::sink::AlertSink;
use super::stats::AlertStats;

/// De-duplicates by `(src_addr, action-family, time bucket)` — the
/// configured default key (§4.I, §6 "alert_dedup_key"). `src_addr` falls
/// back to the agent id when no rule was synthesized for this decision
/// (e.g. `monitor`), since there's nothing else to key on at this stage.
fn dedup_key(decision: &Decision, rule: Option<&UniversalRule>, window_ms: i64, now_ms: i64) -> String {
    let src = rule
        .and_then(|r| r.rule_match.src_cidr)
        .map(|c| c.addr.to_string())
        .unwrap_or_else(|| format!("agent:{}", decision.agent_id));
    let bucket = if window_ms > 0 { now_ms / window_ms } else { now_ms };
    format!("{src}:{:?}:{bucket}", decision.action)
}

pub struct Alerter {
    dedup: Mutex<HashMap<String, i64>>,
    window_ms: i64,
    sinks: Vec<Arc<dyn AlertSink>>,
    stats: Arc<AlertStats>,
}

impl Alerter {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>, window_ms: i64) -> Self {
        Self { dedup: Mutex::new(HashMap::new()), window_ms, sinks, stats: Arc::new(AlertStats::default()) }
    }

    pub fn stats(&self) -> Arc<AlertStats> {
        Arc::clone(&self.stats)
    }

    /// Returns `Some(alert)` when a fresh alert was dispatched to every
    /// sink, `None` when this decision deduped against a recent one.
    pub fn notify(
        self: &Arc<Self>,
        decision: &Decision,
        rule: Option<&UniversalRule>,
        now_ms: i64,
    ) -> Option<Alert> {
        let key = dedup_key(decision, rule, self.window_ms, now_ms);
        {
            let mut seen = self.dedup.lock();
            if let Some(&last) = seen.get(&key) {
                if now_ms.saturating_sub(last) < self.window_ms {
                    self.stats.deduped.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
            seen.insert(key.clone(), now_ms);
        }

        let alert = Alert {
            decision_ref: decision.decision_id,
            rule_ref: rule.map(|r| r.rule_id),
            severity: Severity::for_action(decision.action),
            summary: format!("{:?} chosen for {}", decision.action, decision.agent_id),
            dedup_key: key,
            created_at: now_ms,
        };
        self.dispatch(alert.clone());
        Some(alert)
    }

    /// Fans the alert out to every sink on a background task so a slow
    /// or failing sink never back-pressures the caller (§4.I).
    fn dispatch(self: &Arc<Self>, alert: Alert) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            for sink in &this.sinks {
                match sink.publish(&alert).await {
                    Ok(()) => {
                        this.stats.published.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        this.stats.sink_failures.fetch_add(1, Ordering::Relaxed);
                        warn!(sink = sink.id(), error = %err.reason, "alert sink failed");
                    }
                }
            }
        });
    }

    /// Drops dedup entries older than the configured window so the map
    /// doesn't grow without bound.
    pub fn prune_expired(&self, now_ms: i64) {
        self.dedup.lock().retain(|_, &mut last| now_ms.saturating_sub(last) < self.window_ms);
    }

    pub async fn run_prune_loop(self: Arc<Self>, shutdown: CancellationToken, scan_interval: Duration) {
        let mut tick = tokio::time::interval(scan_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tick.tick() => {}
            }
            self.prune_expired(crate::clock::now_ms());
        }
    }
}

#[cfg(test)]
#[path = "alerter_tests.rs"]
mod tests;
