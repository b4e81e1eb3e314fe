// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ties a parser, the dedup cache and the bus together (§4.F): parse,
//! drop malformed/duplicate records with a counted reason, tag source
//! provenance, publish to the `normalized` topic partitioned by
//! `hash(src_addr)`.

use std::sync::Arc;
use std::time::Duration;

use netdefend_core::ids::SensorId;
use netdefend_core::record::{CommonRecord, SourceMeta};
use tracing::{debug, warn};

use crate::bus::{Bus, PublishError};
use crate::retry::Backoff;

use super::dedup::DedupCache;
use super::parsers::{parser_for, Framing};
use super::stats::IngestStats;

pub struct Normalizer {
    dedup: DedupCache,
    stats: Arc<IngestStats>,
    bus: Arc<dyn Bus<CommonRecord>>,
    publish_deadline: Duration,
    publish_retry: netdefend_core::config::AdapterRetryConfig,
}

impl Normalizer {
    pub fn new(
        dedup_capacity: usize,
        stats: Arc<IngestStats>,
        bus: Arc<dyn Bus<CommonRecord>>,
        publish_deadline: Duration,
        publish_retry: netdefend_core::config::AdapterRetryConfig,
    ) -> Self {
        Self { dedup: DedupCache::new(dedup_capacity), stats, bus, publish_deadline, publish_retry }
    }

    /// Handle one raw collector payload end to end. Never returns an
    /// error upward (§7 "the hot pipeline never throws upward"); all
    /// failure modes are counted.
    pub async fn ingest(&self, framing: Framing, raw: &[u8], tag_sensor: Option<&str>) {
        self.stats.accepted.fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        let parser = parser_for(framing);
        let mut record = match parser.parse(raw) {
            Ok(record) => record,
            Err(reason) => {
                self.stats.parse_errors.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                debug!(reason = %reason, "dropping malformed record");
                return;
            }
        };

        if record.source.is_none() {
            if let Some(sensor) = tag_sensor {
                record.source = Some(SourceMeta {
                    sensor_id: SensorId(sensor.to_string()),
                    capture_origin: format!("{framing:?}"),
                });
            }
        }

        if self.dedup.is_duplicate(&record) {
            self.stats.duplicates_dropped.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            return;
        }

        self.publish_with_retry(record).await;
    }

    async fn publish_with_retry(&self, record: CommonRecord) {
        let key = record.src_addr.to_string();
        let mut backoff = Backoff::new(self.publish_retry);

        loop {
            match self.bus.publish(&key, record.clone(), self.publish_deadline).await {
                Ok(()) => {
                    self.stats.published.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    return;
                }
                Err(PublishError::Unavailable) => {
                    warn!("bus unavailable, dropping record");
                    self.stats
                        .publish_timeouts
                        .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    return;
                }
                Err(PublishError::Timeout) => match backoff.next_delay() {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => {
                        self.stats
                            .publish_timeouts
                            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        warn!("publish retries exhausted, dropping record");
                        return;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
#[path = "normalizer_tests.rs"]
mod tests;
