// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable-after-load artifact snapshots with atomic hot-reload (§9
//! "Artifact lifecycle"): detector parameters, ensemble weights, and
//! agent parameters are all held behind a [`ArtifactHandle`].

use std::sync::Arc;

use parking_lot::RwLock;

/// A reload-able, atomically-swapped pointer to an immutable artifact.
///
/// Readers call [`ArtifactHandle::load`] and get an `Arc` snapshot that
/// stays internally consistent even if a reload races with it — there is
/// no partial-reload state, matching §9's "no partial reloads".
pub struct ArtifactHandle<T> {
    inner: RwLock<Arc<T>>,
}

impl<T> ArtifactHandle<T> {
    pub fn new(value: T) -> Self {
        Self { inner: RwLock::new(Arc::new(value)) }
    }

    pub fn load(&self) -> Arc<T> {
        self.inner.read().clone()
    }

    /// Swap in a new snapshot. Existing `Arc` holders keep the old value
    /// until they drop it.
    pub fn store(&self, value: T) {
        *self.inner.write() = Arc::new(value);
    }
}
