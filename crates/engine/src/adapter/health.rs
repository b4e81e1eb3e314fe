// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background health checker for every registered adapter: periodically
//! probes adapters the orchestrator has paused and resumes the ones that
//! answer healthy again (§4.A "pause the adapter, periodic health
//! probe").

use std::sync::Arc;
use std::time::Duration;

use netdefend_core::error::AdapterOutcome;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::orchestrator::adapter::RuleAdapter;

/// Spawns a single background task that polls every paused adapter on a
/// fixed interval until `shutdown` fires.
pub fn spawn_health_checker(
    adapters: Vec<Arc<dyn RuleAdapter>>,
    shutdown: CancellationToken,
    interval: Duration,
) {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            for adapter in &adapters {
                if !adapter.is_paused() {
                    continue;
                }
                if matches!(adapter.probe().await, AdapterOutcome::Ok) {
                    adapter.resume();
                    info!(adapter = adapter.id(), "adapter healthy again, resuming dispatch");
                }
            }
        }
    });
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
