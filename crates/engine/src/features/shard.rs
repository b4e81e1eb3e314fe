// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One shard's worth of per-key window state (§5: "the `WindowKey` →
//! `Window` map is sharded and each shard is single-writer"). A shard is
//! driven by exactly one task, so all mutation here happens between
//! suspension points with no locking.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use netdefend_core::config::{FeatureEngineConfig, WindowSpec};
use netdefend_core::feature::FeatureVector;
use netdefend_core::record::CommonRecord;
use netdefend_core::window::{Window, WindowKey, WindowKind};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::bus::Bus;

use super::stats::FeatureStats;

/// Tracks the single currently-open window for a tumbling spec, plus the
/// watermark used to decide when its allowed-lateness grace has elapsed.
struct TumblingTrack {
    window: Window,
    high_water_ms: i64,
    last_activity: Instant,
}

/// Tracks every currently-open window for a sliding spec (several are
/// open at once, one per slide tick within the span).
struct SlidingTrack {
    windows: Vec<Window>,
    last_slide_start_ms: i64,
    high_water_ms: i64,
    last_activity: Instant,
}

/// Tracks the single open session window for a key, plus the wall-clock
/// instant of its last activity (§4.E: "wall-clock only for session gap
/// checks").
struct SessionTrack {
    window: Window,
    last_activity: Instant,
    gap_ms: i64,
}

#[derive(Default)]
struct KeyTracks {
    tumbling: HashMap<usize, TumblingTrack>,
    sliding: HashMap<usize, SlidingTrack>,
    session: HashMap<usize, SessionTrack>,
}

impl KeyTracks {
    fn window_count(&self) -> u64 {
        (self.tumbling.len() + self.sliding.iter().map(|(_, t)| t.windows.len()).sum::<usize>() + self.session.len())
            as u64
    }
}

fn floor_div(value: i64, span: i64) -> i64 {
    value.div_euclid(span) * span
}

pub struct Shard {
    config: FeatureEngineConfig,
    keys: HashMap<WindowKey, KeyTracks>,
    recency: LruCache<WindowKey, ()>,
    stats: Arc<FeatureStats>,
    features_bus: Arc<dyn Bus<FeatureVector>>,
}

impl Shard {
    pub fn new(config: FeatureEngineConfig, stats: Arc<FeatureStats>, features_bus: Arc<dyn Bus<FeatureVector>>) -> Self {
        let cap = std::num::NonZeroUsize::new(config.per_key_memory_cap).unwrap_or(std::num::NonZeroUsize::MIN);
        Self { config, keys: HashMap::new(), recency: LruCache::new(cap), stats, features_bus }
    }

    pub async fn run(mut self, mut rx: mpsc::Receiver<CommonRecord>) {
        let mut sweep = tokio::time::interval(Duration::from_millis(1_000));
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                record = rx.recv() => {
                    match record {
                        Some(record) => self.ingest(record).await,
                        None => break,
                    }
                }
                _ = sweep.tick() => self.sweep().await,
            }
        }
    }

    async fn ingest(&mut self, rec: CommonRecord) {
        let key = self.config.key_projection.apply(&rec);
        self.touch_key(&key);

        for (idx, spec) in self.config.windows.clone().iter().enumerate() {
            match spec.kind {
                WindowKind::Tumbling => self.ingest_tumbling(&key, idx, spec, &rec).await,
                WindowKind::Sliding => self.ingest_sliding(&key, idx, spec, &rec).await,
                WindowKind::Session => self.ingest_session(&key, idx, spec, &rec),
            }
        }
    }

    fn touch_key(&mut self, key: &WindowKey) {
        if self.keys.contains_key(key) {
            self.recency.promote(key);
            return;
        }
        if let Some((evicted_key, _)) = self.recency.push(key.clone(), ()) {
            if evicted_key != *key {
                if let Some(tracks) = self.keys.remove(&evicted_key) {
                    self.stats.windows_evicted.fetch_add(tracks.window_count(), Ordering::Relaxed);
                    debug!(key = %evicted_key.0, "evicted coldest key under memory cap");
                }
            }
        }
        self.keys.entry(key.clone()).or_default();
    }

    async fn ingest_tumbling(&mut self, key: &WindowKey, idx: usize, spec: &WindowSpec, rec: &CommonRecord) {
        let lateness = self.config.allowed_lateness_ms;
        let mut closed = Vec::new();
        let mut late = false;

        let tracks = self.keys.entry(key.clone()).or_default();
        let entry = tracks.tumbling.entry(idx).or_insert_with(|| {
            let start = floor_div(rec.t_end, spec.span_ms);
            TumblingTrack {
                window: Window::new(key.clone(), WindowKind::Tumbling, spec.span_ms, start),
                high_water_ms: rec.t_end,
                last_activity: Instant::now(),
            }
        });
        entry.high_water_ms = entry.high_water_ms.max(rec.t_end);
        entry.last_activity = Instant::now();

        while entry.high_water_ms >= entry.window.end_ms + lateness {
            let next_start = entry.window.end_ms;
            let finished = std::mem::replace(
                &mut entry.window,
                Window::new(key.clone(), WindowKind::Tumbling, spec.span_ms, next_start),
            );
            closed.push(finished);
        }

        if entry.window.contains(rec.t_end) {
            entry.window.aggregates.ingest(rec);
        } else {
            // Either truly too late (belongs to an already-closed window)
            // or, in principle, ahead of the window the loop above just
            // opened — which cannot happen since `high_water_ms` already
            // accounts for `rec.t_end` before the loop runs.
            late = true;
        }

        if late {
            self.stats.late_dropped.fetch_add(1, Ordering::Relaxed);
        }
        for w in closed {
            self.emit_if_populated(w).await;
        }
    }

    async fn ingest_sliding(&mut self, key: &WindowKey, idx: usize, spec: &WindowSpec, rec: &CommonRecord) {
        let slide_ms = spec.slide_ms.unwrap_or(spec.span_ms);
        let lateness = self.config.allowed_lateness_ms;
        let mut closed = Vec::new();
        let mut late = false;

        let tracks = self.keys.entry(key.clone()).or_default();
        let entry = tracks.sliding.entry(idx).or_insert_with(|| SlidingTrack {
            windows: Vec::new(),
            last_slide_start_ms: floor_div(rec.t_end, slide_ms) - slide_ms,
            high_water_ms: rec.t_end,
            last_activity: Instant::now(),
        });
        entry.high_water_ms = entry.high_water_ms.max(rec.t_end);
        entry.last_activity = Instant::now();

        while entry.windows.is_empty() || entry.high_water_ms >= entry.last_slide_start_ms + slide_ms {
            let new_start = entry.last_slide_start_ms + slide_ms;
            entry.windows.push(Window::new(key.clone(), WindowKind::Sliding, spec.span_ms, new_start));
            entry.last_slide_start_ms = new_start;
        }

        let high_water = entry.high_water_ms;
        let mut i = 0;
        while i < entry.windows.len() {
            if high_water >= entry.windows[i].end_ms + lateness {
                closed.push(entry.windows.remove(i));
            } else {
                i += 1;
            }
        }

        let earliest_start = entry.windows.first().map(|w| w.start_ms);
        let mut assigned = false;
        for w in entry.windows.iter_mut() {
            if w.contains(rec.t_end) {
                w.aggregates.ingest(rec);
                assigned = true;
            }
        }
        if !assigned && earliest_start.is_some_and(|start| rec.t_end < start) {
            late = true;
        }

        if late {
            self.stats.late_dropped.fetch_add(1, Ordering::Relaxed);
        }
        for w in closed {
            self.emit_if_populated(w).await;
        }
    }

    fn ingest_session(&mut self, key: &WindowKey, idx: usize, spec: &WindowSpec, rec: &CommonRecord) {
        let tracks = self.keys.entry(key.clone()).or_default();
        let entry = tracks.session.entry(idx).or_insert_with(|| SessionTrack {
            window: Window::new(key.clone(), WindowKind::Session, 0, rec.t_end),
            last_activity: Instant::now(),
            gap_ms: spec.gap_ms,
        });
        entry.last_activity = Instant::now();
        entry.window.end_ms = entry.window.end_ms.max(rec.t_end + 1);
        entry.window.aggregates.ingest(rec);
    }

    /// Force-close windows whose boundary has elapsed even without a new
    /// arrival. Session windows have no other closure trigger at all.
    /// Tumbling/sliding windows normally close only when a later record
    /// advances `high_water_ms` past `end_ms + lateness` (§4.E) — a key
    /// that goes idle before that happens would otherwise sit open
    /// forever and never emit. This sweep force-closes a tumbling/sliding
    /// track once wall-clock time since its last arrival exceeds
    /// `span_ms + lateness`, the same span the record-driven path would
    /// have needed to elapse in event time. Grounded in the
    /// orchestrator's background expiry-scan loop (§4.B) — same
    /// "periodic sweep over live state" shape, applied here to windows
    /// instead of rules.
    async fn sweep(&mut self) {
        let mut to_emit = Vec::new();
        let lateness = self.config.allowed_lateness_ms;
        let specs = self.config.windows.clone();
        let keys: Vec<WindowKey> = self.keys.keys().cloned().collect();
        for key in keys {
            let Some(tracks) = self.keys.get_mut(&key) else { continue };

            let mut closed_sessions = Vec::new();
            tracks.session.retain(|_, track| {
                if track.last_activity.elapsed() >= Duration::from_millis(track.gap_ms.max(0) as u64) {
                    closed_sessions.push(track.window.clone());
                    false
                } else {
                    true
                }
            });
            to_emit.extend(closed_sessions);

            let mut closed_tumbling = Vec::new();
            tracks.tumbling.retain(|idx, track| {
                let idle_threshold = specs.get(*idx).map_or(0, |spec| spec.span_ms + lateness).max(0) as u64;
                if track.last_activity.elapsed() >= Duration::from_millis(idle_threshold) {
                    closed_tumbling.push(track.window.clone());
                    false
                } else {
                    true
                }
            });
            to_emit.extend(closed_tumbling);

            let mut closed_sliding = Vec::new();
            tracks.sliding.retain(|idx, track| {
                let idle_threshold = specs.get(*idx).map_or(0, |spec| spec.span_ms + lateness).max(0) as u64;
                if track.last_activity.elapsed() >= Duration::from_millis(idle_threshold) {
                    closed_sliding.append(&mut track.windows);
                    false
                } else {
                    true
                }
            });
            to_emit.extend(closed_sliding);
        }
        for w in to_emit {
            self.emit_if_populated(w).await;
        }
    }

    async fn emit_if_populated(&self, window: Window) {
        if window.aggregates.record_count == 0 {
            return;
        }
        let fv = FeatureVector::from_window(&window);
        self.stats.windows_emitted.fetch_add(1, Ordering::Relaxed);
        let key = window.key.0.clone();
        if self.features_bus.publish(&key, fv, Duration::from_millis(50)).await.is_err() {
            warn!(key, "failed to publish closed feature vector");
        }
    }
}

#[cfg(test)]
#[path = "shard_tests.rs"]
mod tests;
