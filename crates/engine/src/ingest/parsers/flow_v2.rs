// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow-record framing #2: connection-log style naming (`orig`/`resp`
//! instead of `in`/`out`, a duration instead of two timestamps).

use std::net::IpAddr;

use netdefend_core::error::ParseErrorReason;
use netdefend_core::ids::{FlowId, SensorId};
use netdefend_core::record::{
    CommonRecord, DirectionCounts, Protocol, SourceMeta, TcpFlagCounts,
};
use serde::Deserialize;

use super::RecordParser;

#[derive(Debug, Deserialize)]
struct WireFlowV2 {
    ts_ms: i64,
    duration_ms: i64,
    orig_addr: IpAddr,
    orig_port: u16,
    resp_addr: IpAddr,
    resp_port: u16,
    proto: String,
    orig_bytes: u64,
    resp_bytes: u64,
    orig_pkts: u64,
    resp_pkts: u64,
    #[serde(default)]
    conn_state: Option<String>,
    uid: String,
    #[serde(default)]
    sensor: Option<String>,
}

fn protocol_from_str(proto: &str) -> Result<Protocol, ParseErrorReason> {
    match proto.to_ascii_lowercase().as_str() {
        "tcp" => Ok(Protocol::Tcp),
        "udp" => Ok(Protocol::Udp),
        "icmp" => Ok(Protocol::Icmp),
        other => other
            .parse::<u8>()
            .map(Protocol::Other)
            .map_err(|_| ParseErrorReason::ProtocolMismatch),
    }
}

/// Zeek `conn_state` carries coarse signal about how the connection ended;
/// map the handful that imply a reset/rejection to the RST flag count so
/// downstream feature slots relying on `rst_ratio` see it.
fn flags_from_conn_state(state: Option<&str>) -> TcpFlagCounts {
    let saw_rst = matches!(state, Some("RSTO") | Some("RSTR") | Some("REJ"));
    TcpFlagCounts { rst: saw_rst as u32, ..TcpFlagCounts::default() }
}

pub struct FlowV2Parser;

impl RecordParser for FlowV2Parser {
    fn parse(&self, raw: &[u8]) -> Result<CommonRecord, ParseErrorReason> {
        if raw.is_empty() {
            return Err(ParseErrorReason::ZeroLengthRecord);
        }
        let wire: WireFlowV2 =
            serde_json::from_slice(raw).map_err(|_| ParseErrorReason::BadFieldEncoding)?;

        if wire.uid.is_empty() {
            return Err(ParseErrorReason::TruncatedHeader);
        }
        if wire.duration_ms < 0 {
            return Err(ParseErrorReason::BadFieldEncoding);
        }
        let protocol = protocol_from_str(&wire.proto)?;

        let source = wire.sensor.map(|sensor_id| SourceMeta {
            sensor_id: SensorId(sensor_id),
            capture_origin: "flow_v2".to_string(),
        });

        Ok(CommonRecord {
            t_start: wire.ts_ms,
            t_end: wire.ts_ms + wire.duration_ms,
            src_addr: wire.orig_addr,
            src_port: wire.orig_port,
            dst_addr: wire.resp_addr,
            dst_port: wire.resp_port,
            protocol,
            fwd: DirectionCounts { bytes: wire.orig_bytes, packets: wire.orig_pkts },
            rev: DirectionCounts { bytes: wire.resp_bytes, packets: wire.resp_pkts },
            tcp_flags: flags_from_conn_state(wire.conn_state.as_deref()),
            flow_id: FlowId(wire.uid),
            source,
        })
    }
}

#[cfg(test)]
#[path = "flow_v2_tests.rs"]
mod tests;
