// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawns the sharded window-tracking workers (§5) and routes every
//! normalized record to the shard owning its key's state, the same way
//! [`crate::bus::partition_of`] routes bus messages to partitions.

use std::sync::Arc;

use netdefend_core::config::FeatureEngineConfig;
use netdefend_core::feature::FeatureVector;
use netdefend_core::record::CommonRecord;
use tokio::sync::mpsc;
use tracing::warn;

use crate::bus::{partition_of, Bus};

use super::shard::Shard;
use super::stats::FeatureStats;

pub struct FeatureEngine {
    config: FeatureEngineConfig,
    shard_count: u32,
    normalized_bus: Arc<dyn Bus<CommonRecord>>,
    features_bus: Arc<dyn Bus<FeatureVector>>,
    stats: Arc<FeatureStats>,
}

impl FeatureEngine {
    pub fn new(
        config: FeatureEngineConfig,
        shard_count: u32,
        normalized_bus: Arc<dyn Bus<CommonRecord>>,
        features_bus: Arc<dyn Bus<FeatureVector>>,
        stats: Arc<FeatureStats>,
    ) -> Self {
        Self { config, shard_count: shard_count.max(1), normalized_bus, features_bus, stats }
    }

    pub fn stats(&self) -> Arc<FeatureStats> {
        Arc::clone(&self.stats)
    }

    /// Spawn one task per shard plus a router task that subscribes to
    /// the normalized-record bus and forwards each record to its
    /// shard's channel. Runs until the bus subscription ends.
    pub async fn run(self) {
        let mut senders = Vec::with_capacity(self.shard_count as usize);
        for _ in 0..self.shard_count {
            let (tx, rx) = mpsc::channel(1_024);
            let shard = Shard::new(self.config.clone(), Arc::clone(&self.stats), Arc::clone(&self.features_bus));
            tokio::spawn(shard.run(rx));
            senders.push(tx);
        }

        let key_projection = self.config.key_projection;
        let shard_count = self.shard_count;
        let stats = Arc::clone(&self.stats);
        let handler: Box<dyn Fn(crate::bus::BusMessage<CommonRecord>) + Send + Sync> = Box::new(move |msg| {
            let key = key_projection.apply(&msg.payload).0;
            let idx = partition_of(&key, shard_count) as usize;
            if senders[idx].try_send(msg.payload).is_err() {
                stats.shard_channel_dropped.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                warn!(shard = idx, "feature engine shard channel full, dropping record");
            }
        });

        if let Err(err) = self.normalized_bus.subscribe("feature-engine", handler).await {
            warn!(error = %err, "feature engine lost its normalized-record subscription");
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
