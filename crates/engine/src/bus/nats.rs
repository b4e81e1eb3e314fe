// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! NATS-backed external bus. Each logical partition maps to a subject
//! `{prefix}.p{n}`; `publish` hashes the key the same way `inproc` does
//! so the two backends assign the same record to the same partition
//! number, just carried over different transport.

use std::time::Duration;

use futures_util::StreamExt;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{partition_of, Bus, BusFuture, BusMessage, PublishError};

#[derive(Debug, Clone)]
pub struct NatsBusConfig {
    pub url: String,
    pub token: Option<String>,
    pub prefix: String,
    pub partition_count: u32,
}

pub struct NatsBus {
    client: async_nats::Client,
    prefix: String,
    partition_count: u32,
}

impl NatsBus {
    pub async fn connect(config: &NatsBusConfig) -> anyhow::Result<Self> {
        let mut opts = async_nats::ConnectOptions::new();
        if let Some(ref token) = config.token {
            opts = opts.token(token.clone());
        }
        opts = opts.retry_on_initial_connect();

        info!(url = %config.url, prefix = %config.prefix, "connecting NATS bus");
        let client = opts.connect(&config.url).await?;
        info!("NATS bus connected");

        Ok(Self {
            client,
            prefix: config.prefix.clone(),
            partition_count: config.partition_count.max(1),
        })
    }

    fn subject_for(&self, partition: u32) -> String {
        format!("{}.partition.{}", self.prefix, partition)
    }
}

impl<T> Bus<T> for NatsBus
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn publish<'a>(
        &'a self,
        key: &'a str,
        payload: T,
        deadline: Duration,
    ) -> BusFuture<'a, Result<(), PublishError>> {
        Box::pin(async move {
            let partition = partition_of(key, self.partition_count);
            let subject = self.subject_for(partition);
            let json = serde_json::to_vec(&payload).map_err(|_| PublishError::Unavailable)?;

            tokio::time::timeout(deadline, self.client.publish(subject, json.into()))
                .await
                .map_err(|_| PublishError::Timeout)?
                .map_err(|e| {
                    warn!(err = %e, "NATS publish failed");
                    PublishError::Unavailable
                })
        })
    }

    fn subscribe<'a>(
        &'a self,
        consumer_group: &'a str,
        handler: Box<dyn Fn(BusMessage<T>) + Send + Sync>,
    ) -> BusFuture<'a, Result<(), PublishError>> {
        Box::pin(async move {
            let subject = format!("{}.partition.*", self.prefix);
            let mut sub = self
                .client
                .subscribe(subject)
                .await
                .map_err(|_| PublishError::Unavailable)?;
            debug!(consumer_group, prefix = %self.prefix, "NATS subscriber attached");

            let mut offset = 0u64;
            while let Some(msg) = sub.next().await {
                let partition = msg
                    .subject
                    .as_str()
                    .rsplit('.')
                    .next()
                    .and_then(|s| s.parse::<u32>().ok())
                    .unwrap_or(0);
                match serde_json::from_slice::<T>(&msg.payload) {
                    Ok(payload) => {
                        handler(BusMessage { partition, offset, payload });
                        offset += 1;
                    }
                    Err(e) => warn!(err = %e, "dropping undecodable NATS message"),
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "nats_tests.rs"]
mod tests;
