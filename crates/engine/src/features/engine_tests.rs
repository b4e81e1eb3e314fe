// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use netdefend_core::config::{FeatureEngineConfig, WindowSpec};
use netdefend_core::ids::{FlowId, SensorId};
use netdefend_core::record::{CommonRecord, DirectionCounts, Protocol, SourceMeta, TcpFlagCounts};
use netdefend_core::window::{KeyProjection, WindowKind};

use crate::bus::inproc::InprocBus;

use super::*;

fn record() -> CommonRecord {
    CommonRecord {
        t_start: 0,
        t_end: 0,
        src_addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
        src_port: 51_000,
        dst_addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
        dst_port: 443,
        protocol: Protocol::Tcp,
        fwd: DirectionCounts { bytes: 100, packets: 2 },
        rev: DirectionCounts { bytes: 40, packets: 1 },
        tcp_flags: TcpFlagCounts { syn: 1, ..Default::default() },
        flow_id: FlowId("f1".into()),
        source: Some(SourceMeta { sensor_id: SensorId("s1".into()), capture_origin: "edge-1".into() }),
    }
}

#[tokio::test]
async fn routed_record_is_aggregated_and_emitted_as_a_feature_vector() {
    let normalized_bus: Arc<dyn Bus<CommonRecord>> = Arc::new(InprocBus::new(2, 16));
    let features_bus: Arc<dyn Bus<FeatureVector>> = Arc::new(InprocBus::new(2, 16));
    let stats = Arc::new(FeatureStats::default());

    let config = FeatureEngineConfig {
        key_projection: KeyProjection::SrcAddr,
        windows: vec![WindowSpec { kind: WindowKind::Tumbling, span_ms: 1_000, slide_ms: None, gap_ms: 300_000 }],
        allowed_lateness_ms: 0,
        per_key_memory_cap: 10,
    };

    let engine = FeatureEngine::new(config, 2, Arc::clone(&normalized_bus), Arc::clone(&features_bus), Arc::clone(&stats));
    tokio::spawn(engine.run());

    // Give the router and shards a moment to attach their subscriptions.
    tokio::time::sleep(Duration::from_millis(20)).await;

    normalized_bus.publish("10.0.0.1", record(), Duration::from_millis(10)).await.expect("publish ok");
    let mut later = record();
    later.t_end = 1_000;
    normalized_bus.publish("10.0.0.1", later, Duration::from_millis(10)).await.expect("publish ok");

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(stats.windows_emitted.load(std::sync::atomic::Ordering::Relaxed), 1);
}
