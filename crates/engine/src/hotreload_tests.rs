// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::*;

#[tokio::test]
async fn poll_fallback_calls_on_change_without_a_filesystem_event() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("artifact.json");
    std::fs::write(&path, b"{}").expect("write");

    let watcher = FileWatcher::new(path).with_poll_interval(Duration::from_millis(10));
    let shutdown = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);

    let shutdown_clone = shutdown.clone();
    let handle = tokio::spawn(async move {
        watcher.run(shutdown_clone, move |_path| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();
    handle.await.expect("watcher task join");

    assert!(calls.load(Ordering::SeqCst) >= 1);
}
