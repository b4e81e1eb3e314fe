// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The RuleState table: single-writer-per-rule, readers see consistent
//! snapshots (§5 "Shared resources"). Each rule's entry is its own lock
//! so two different rules can be mutated concurrently without
//! contending on the whole table.

use std::collections::HashMap;
use std::sync::Arc;

use netdefend_core::ids::RuleId;
use netdefend_core::rule::{RuleLifecycle, RuleState, UniversalRule};
use parking_lot::{Mutex, RwLock};

struct Entry {
    rule: UniversalRule,
    state: RuleState,
}

#[derive(Default)]
pub struct RuleStore {
    entries: RwLock<HashMap<RuleId, Arc<Mutex<Entry>>>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, rule: UniversalRule, now_ms: i64) {
        let state = RuleState::new(rule.rule_id, now_ms);
        let entry = Arc::new(Mutex::new(Entry { rule, state }));
        self.entries.write().insert(entry.lock().rule.rule_id, entry);
    }

    pub fn snapshot(&self, rule_id: RuleId) -> Option<(UniversalRule, RuleState)> {
        let entry = self.entries.read().get(&rule_id)?.clone();
        let guard = entry.lock();
        Some((guard.rule.clone(), guard.state.clone()))
    }

    /// Every rule currently in a "live" lifecycle state — `pending`,
    /// `applying`, or `active` — the set conflict detection checks new
    /// candidates against.
    pub fn live_snapshot(&self) -> Vec<(UniversalRule, RuleState)> {
        self.all_snapshot()
            .into_iter()
            .filter(|(_, state)| {
                matches!(state.lifecycle, RuleLifecycle::Pending | RuleLifecycle::Applying | RuleLifecycle::Active)
            })
            .collect()
    }

    pub fn all_snapshot(&self) -> Vec<(UniversalRule, RuleState)> {
        self.entries
            .read()
            .values()
            .map(|entry| {
                let guard = entry.lock();
                (guard.rule.clone(), guard.state.clone())
            })
            .collect()
    }

    /// Mutates one rule's state under its own lock, returning `None` if
    /// it's not in the store.
    pub fn with_state_mut<R>(&self, rule_id: RuleId, f: impl FnOnce(&mut RuleState) -> R) -> Option<R> {
        let entry = self.entries.read().get(&rule_id)?.clone();
        let mut guard = entry.lock();
        Some(f(&mut guard.state))
    }

    pub fn remove(&self, rule_id: RuleId) {
        self.entries.write().remove(&rule_id);
    }

    /// Extends an existing rule's `ttl` in place (§4.B conflict
    /// detection case (a): "identical match + identical action ->
    /// dedupe, bump ttl").
    pub fn bump_ttl(&self, rule_id: RuleId, extra_ms: i64, now_ms: i64) -> Option<()> {
        let entry = self.entries.read().get(&rule_id)?.clone();
        let mut guard = entry.lock();
        if let Some(ttl) = guard.rule.ttl_ms.as_mut() {
            *ttl += extra_ms;
        }
        guard.state.updated_at = now_ms;
        Some(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
