// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded LRU dedup by `(sensor_id, flow_id, t_end)` (§4.F). A record
//! whose key is already present is a duplicate delivery (at-least-once
//! collector retries, multi-homed sensors re-reporting the same flow).

use std::num::NonZeroUsize;

use lru::LruCache;
use netdefend_core::record::CommonRecord;
use parking_lot::Mutex;

pub struct DedupCache {
    seen: Mutex<LruCache<(String, String, i64), ()>>,
}

impl DedupCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { seen: Mutex::new(LruCache::new(cap)) }
    }

    /// Returns `true` if `record` has already been seen (and should be
    /// dropped), inserting its key if not. §4.F: dedup does not evict
    /// counted as an error — `DedupCacheFull` only applies to insertion
    /// pressure, which `LruCache` absorbs by evicting the coldest key.
    pub fn is_duplicate(&self, record: &CommonRecord) -> bool {
        let key = record.dedup_key();
        let mut seen = self.seen.lock();
        if seen.contains(&key) {
            true
        } else {
            seen.put(key, ());
            false
        }
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "dedup_tests.rs"]
mod tests;
