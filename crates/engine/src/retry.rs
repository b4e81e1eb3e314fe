// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff with jitter, shared by the ingest publisher (§4.F)
//! and the adapter retry loop (§4.A/§4.B). Doubling is capped at
//! `max_ms`; jitter avoids synchronized retry storms across workers.

use std::time::Duration;

use netdefend_core::config::AdapterRetryConfig;
use rand::Rng;

pub struct Backoff {
    attempt: u32,
    config: AdapterRetryConfig,
}

impl Backoff {
    pub fn new(config: AdapterRetryConfig) -> Self {
        Self { attempt: 0, config }
    }

    pub fn attempts_exhausted(&self) -> bool {
        self.attempt >= self.config.max_attempts
    }

    /// Advance to the next attempt and return the delay to sleep before
    /// it, or `None` if attempts are exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts_exhausted() {
            return None;
        }
        let exp = self.config.base_ms.saturating_mul(1u64 << self.attempt.min(20));
        let capped = exp.min(self.config.max_ms);
        let jittered = rand::rng().random_range(capped / 2..=capped.max(1));
        self.attempt += 1;
        Some(Duration::from_millis(jittered))
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
