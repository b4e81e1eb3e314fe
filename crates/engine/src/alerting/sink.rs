// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Downstream alert sinks (§4.I "Publishes to sinks; sink failures are
//! counted but never back-pressure the detection pipeline").

use std::future::Future;
use std::pin::Pin;

use netdefend_core::alert::Alert;
use tracing::warn;

type SinkFuture<'a, O> = Pin<Box<dyn Future<Output = O> + Send + 'a>>;

/// Why a sink failed to accept an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError {
    pub reason: String,
}

/// Object-safe async contract, the same shape as
/// [`crate::orchestrator::adapter::RuleAdapter`].
pub trait AlertSink: Send + Sync {
    fn id(&self) -> &str;

    fn publish<'a>(&'a self, alert: &'a Alert) -> SinkFuture<'a, Result<(), SinkError>>;
}

/// The default sink: structured log lines. Always succeeds — a real
/// deployment layers webhook/pager sinks alongside this one so an alert
/// is never silently lost even if every network sink is down.
pub struct LogSink {
    id: String,
}

impl LogSink {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl AlertSink for LogSink {
    fn id(&self) -> &str {
        &self.id
    }

    fn publish<'a>(&'a self, alert: &'a Alert) -> SinkFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            warn!(
                decision_ref = %alert.decision_ref,
                rule_ref = ?alert.rule_ref,
                severity = %alert.severity,
                dedup_key = %alert.dedup_key,
                "{}",
                alert.summary,
            );
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
