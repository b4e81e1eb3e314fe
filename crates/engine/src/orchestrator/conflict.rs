// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves a candidate rule against the currently-live rules whose match
//! sets intersect it (§4.B "Conflict detection"). Lower `priority` values
//! win ties, matching the base-priority table where `deny` (10) outranks
//! `monitor` (60000).

use netdefend_core::ids::RuleId;
use netdefend_core::rule::UniversalRule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictOutcome {
    /// Identical match + identical action family: don't insert a new
    /// rule, just bump the existing one's `ttl`.
    Dedupe { existing: RuleId },
    /// Identical match + conflicting action, candidate has the better
    /// (lower) priority: the listed existing rules transition to
    /// `rolled_back`, the candidate proceeds.
    CandidateWins { losers: Vec<RuleId> },
    /// Identical match + conflicting action, an existing rule already
    /// has the better priority: the candidate must not be applied.
    CandidateLoses,
    /// Overlapping but non-identical match, or no intersection at all:
    /// both remain; priority alone orders them at the adapter.
    NoConflict,
}

pub fn resolve(candidate: &UniversalRule, live: &[(UniversalRule, netdefend_core::rule::RuleState)]) -> ConflictOutcome {
    let intersecting: Vec<&(UniversalRule, netdefend_core::rule::RuleState)> =
        live.iter().filter(|(rule, _)| rule.rule_match.intersects(&candidate.rule_match)).collect();

    if let Some((existing, _)) = intersecting
        .iter()
        .find(|(rule, _)| rule.rule_match == candidate.rule_match && rule.action.family() == candidate.action.family())
    {
        return ConflictOutcome::Dedupe { existing: existing.rule_id };
    }

    let identical_conflicting: Vec<&UniversalRule> = intersecting
        .iter()
        .filter(|(rule, _)| rule.rule_match == candidate.rule_match && rule.action.family() != candidate.action.family())
        .map(|(rule, _)| rule)
        .collect();

    if identical_conflicting.is_empty() {
        return ConflictOutcome::NoConflict;
    }

    if identical_conflicting.iter().any(|rule| rule.priority <= candidate.priority) {
        ConflictOutcome::CandidateLoses
    } else {
        ConflictOutcome::CandidateWins { losers: identical_conflicting.iter().map(|rule| rule.rule_id).collect() }
    }
}

#[cfg(test)]
#[path = "conflict_tests.rs"]
mod tests;
