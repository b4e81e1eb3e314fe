// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::net::{IpAddr, Ipv4Addr};

use netdefend_core::ids::FlowId;
use netdefend_core::record::{CommonRecord, DirectionCounts, Protocol, TcpFlagCounts};

use super::*;

fn record(flow_id: &str, t_end: i64) -> CommonRecord {
    CommonRecord {
        t_start: t_end - 1000,
        t_end,
        src_addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
        src_port: 1,
        dst_addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
        dst_port: 2,
        protocol: Protocol::Tcp,
        fwd: DirectionCounts::default(),
        rev: DirectionCounts::default(),
        tcp_flags: TcpFlagCounts::default(),
        flow_id: FlowId(flow_id.to_string()),
        source: None,
    }
}

#[test]
fn first_sighting_is_not_a_duplicate() {
    let cache = DedupCache::new(16);
    assert!(!cache.is_duplicate(&record("f1", 100)));
}

#[test]
fn repeat_key_is_a_duplicate() {
    let cache = DedupCache::new(16);
    assert!(!cache.is_duplicate(&record("f1", 100)));
    assert!(cache.is_duplicate(&record("f1", 100)));
}

#[test]
fn different_t_end_is_a_distinct_key() {
    let cache = DedupCache::new(16);
    assert!(!cache.is_duplicate(&record("f1", 100)));
    assert!(!cache.is_duplicate(&record("f1", 200)));
}

#[test]
fn capacity_eviction_lets_old_keys_repeat() {
    let cache = DedupCache::new(2);
    assert!(!cache.is_duplicate(&record("f1", 1)));
    assert!(!cache.is_duplicate(&record("f2", 1)));
    assert!(!cache.is_duplicate(&record("f3", 1))); // evicts f1
    assert!(!cache.is_duplicate(&record("f1", 1))); // f1 was evicted, looks new
}
