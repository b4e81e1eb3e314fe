// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared file-watching loop for artifact hot-reload (§9 "Artifact
//! lifecycle"), used by both the detection ensemble and the policy
//! agent's learned-artifact watchers. Mirrors the teacher's
//! `crates/cli/src/driver/log_watch.rs::LogWatcher`: a `notify`
//! filesystem event is the fast path, a periodic poll is the fallback.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct FileWatcher {
    path: PathBuf,
    poll_interval: Duration,
}

impl FileWatcher {
    pub fn new(path: PathBuf) -> Self {
        Self { path, poll_interval: Duration::from_secs(10) }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Calls `on_change` every time the watched file changes (or the
    /// poll fallback fires — which, since `tokio::time::interval` ticks
    /// immediately on its first call, also covers the very first load),
    /// until `shutdown` is cancelled. Callers that need a value before
    /// this resolves its first tick should load one synchronously
    /// before spawning the watcher.
    pub async fn run(self, shutdown: CancellationToken, mut on_change: impl FnMut(&Path) + Send) {
        let (wake_tx, mut wake_rx) = mpsc::channel::<()>(1);
        let _watcher = self.setup_notify_watcher(wake_tx);
        let mut poll = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = wake_rx.recv() => {}
                _ = poll.tick() => {}
            }
            on_change(&self.path);
        }
    }

    fn setup_notify_watcher(&self, wake_tx: mpsc::Sender<()>) -> Option<notify::RecommendedWatcher> {
        use notify::{RecursiveMode, Watcher};

        let mut watcher = notify::recommended_watcher(move |_: notify::Result<notify::Event>| {
            let _ = wake_tx.try_send(());
        })
        .ok()?;

        let watch_path = self.path.parent().unwrap_or(self.path.as_path());
        watcher.watch(watch_path, RecursiveMode::NonRecursive).ok()?;
        Some(watcher)
    }
}

#[cfg(test)]
#[path = "hotreload_tests.rs"]
mod tests;
