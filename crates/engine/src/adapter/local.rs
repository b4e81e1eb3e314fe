// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A local packet-filter chain adapter: an in-memory stand-in for an
//! nftables/iptables backend that natively supports CIDR + port-range
//! matches, so `apply` never needs to split a rule (§4.A).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};

use netdefend_core::error::AdapterOutcome;
use netdefend_core::ids::RuleId;
use netdefend_core::rule::{RuleAction, UniversalRule};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::adapter::stats::AdapterStats;
use crate::orchestrator::adapter::{AdapterApplyResult, AdapterRuleQuery, RuleAdapter};
use std::sync::Arc;

type AdapterFuture<'a, O> = Pin<Box<dyn Future<Output = O> + Send + 'a>>;

#[derive(Debug, Clone)]
struct NativeRule {
    rule_id: RuleId,
    chain_line: String,
}

/// Renders a `UniversalRule` into a single `nft`-style chain line. Real
/// backends vary in syntax; the shape here only needs to be stable and
/// idempotent, not byte-for-byte correct nftables grammar.
fn render_chain_line(rule: &UniversalRule) -> String {
    let verdict = match rule.action {
        RuleAction::Allow => "accept".to_string(),
        RuleAction::Deny => "drop".to_string(),
        RuleAction::RateLimit { pps } => format!("limit rate {pps}/second accept"),
        RuleAction::Quarantine { ttl_ms } => format!("drop comment \"quarantine_ms={ttl_ms}\""),
        RuleAction::Monitor => "log accept".to_string(),
    };
    let src = rule
        .rule_match
        .src_cidr
        .map(|c| format!("ip saddr {}/{}", c.addr, c.prefix_len))
        .unwrap_or_default();
    let ports = rule
        .rule_match
        .dst_ports
        .map(|(lo, hi)| if lo == hi { format!("tcp dport {lo}") } else { format!("tcp dport {lo}-{hi}") })
        .unwrap_or_default();
    format!("{src} {ports} {verdict}").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The local packet-filter adapter. Holds only the in-process chain
/// table; it has no network resources to pause/resume, but still
/// implements the capability so a health checker polling every adapter
/// uniformly never needs a special case for it.
pub struct LocalFilterAdapter {
    id: String,
    chain: Mutex<HashMap<String, NativeRule>>,
    paused: AtomicBool,
    stats: Arc<AdapterStats>,
}

impl LocalFilterAdapter {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            chain: Mutex::new(HashMap::new()),
            paused: AtomicBool::new(false),
            stats: Arc::new(AdapterStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<AdapterStats> {
        Arc::clone(&self.stats)
    }
}

impl RuleAdapter for LocalFilterAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply<'a>(&'a self, rule: &'a UniversalRule) -> AdapterFuture<'a, AdapterApplyResult> {
        Box::pin(async move {
            let mut chain = self.chain.lock();
            // A retry of the same rule_id reuses its existing native
            // line instead of inserting a duplicate chain entry (§4.A
            // "idempotent on retry").
            let native_id = chain
                .iter()
                .find(|(_, entry)| entry.rule_id == rule.rule_id)
                .map(|(id, _)| id.clone())
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let entry = NativeRule { rule_id: rule.rule_id, chain_line: render_chain_line(rule) };
            chain.insert(native_id.clone(), entry);
            drop(chain);
            self.stats.applies_ok.fetch_add(1, Ordering::Relaxed);
            AdapterApplyResult { outcome: AdapterOutcome::Ok, per_rule_id: Some(native_id) }
        })
    }

    fn remove<'a>(&'a self, rule_id: &'a RuleId, per_rule_id: Option<&'a str>) -> AdapterFuture<'a, AdapterOutcome> {
        Box::pin(async move {
            let mut chain = self.chain.lock();
            match per_rule_id {
                Some(id) => {
                    chain.remove(id);
                }
                None => chain.retain(|_, entry| entry.rule_id != *rule_id),
            }
            self.stats.removes.fetch_add(1, Ordering::Relaxed);
            AdapterOutcome::Ok
        })
    }

    fn query<'a>(&'a self, per_rule_id: &'a str) -> AdapterFuture<'a, Option<AdapterRuleQuery>> {
        Box::pin(async move {
            self.chain.lock().get(per_rule_id).map(|entry| AdapterRuleQuery {
                per_rule_id: per_rule_id.to_string(),
                present: true,
                native_description: entry.chain_line.clone(),
            })
        })
    }

    fn list<'a>(&'a self) -> AdapterFuture<'a, Vec<String>> {
        Box::pin(async move { self.chain.lock().keys().cloned().collect() })
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
        self.stats.pauses.fetch_add(1, Ordering::Relaxed);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
