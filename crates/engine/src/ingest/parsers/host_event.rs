// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-event framing: an endpoint agent's socket-connect event. No
//! packet counts are available at this layer, only a byte total and a
//! point-in-time timestamp — `t_start == t_end`, one packet assumed per
//! direction that moved bytes.

use std::net::IpAddr;

use netdefend_core::error::ParseErrorReason;
use netdefend_core::ids::{FlowId, SensorId};
use netdefend_core::record::{
    CommonRecord, DirectionCounts, Protocol, SourceMeta, TcpFlagCounts,
};
use serde::Deserialize;

use super::RecordParser;

#[derive(Debug, Deserialize)]
struct WireHostEvent {
    observed_at_ms: i64,
    local_addr: IpAddr,
    local_port: u16,
    remote_addr: IpAddr,
    remote_port: u16,
    transport: String,
    bytes_sent: u64,
    bytes_received: u64,
    event_id: String,
    #[serde(default)]
    host_id: Option<String>,
}

fn protocol_from_transport(transport: &str) -> Result<Protocol, ParseErrorReason> {
    match transport.to_ascii_lowercase().as_str() {
        "tcp" => Ok(Protocol::Tcp),
        "udp" => Ok(Protocol::Udp),
        _ => Err(ParseErrorReason::ProtocolMismatch),
    }
}

pub struct HostEventParser;

impl RecordParser for HostEventParser {
    fn parse(&self, raw: &[u8]) -> Result<CommonRecord, ParseErrorReason> {
        if raw.is_empty() {
            return Err(ParseErrorReason::ZeroLengthRecord);
        }
        let wire: WireHostEvent =
            serde_json::from_slice(raw).map_err(|_| ParseErrorReason::BadFieldEncoding)?;

        if wire.event_id.is_empty() {
            return Err(ParseErrorReason::TruncatedHeader);
        }
        let protocol = protocol_from_transport(&wire.transport)?;

        let source = wire.host_id.map(|sensor_id| SourceMeta {
            sensor_id: SensorId(sensor_id),
            capture_origin: "host_event".to_string(),
        });

        Ok(CommonRecord {
            t_start: wire.observed_at_ms,
            t_end: wire.observed_at_ms,
            src_addr: wire.local_addr,
            src_port: wire.local_port,
            dst_addr: wire.remote_addr,
            dst_port: wire.remote_port,
            protocol,
            fwd: DirectionCounts { bytes: wire.bytes_sent, packets: (wire.bytes_sent > 0) as u64 },
            rev: DirectionCounts {
                bytes: wire.bytes_received,
                packets: (wire.bytes_received > 0) as u64,
            },
            tcp_flags: TcpFlagCounts::default(),
            flow_id: FlowId(wire.event_id),
            source,
        })
    }
}

#[cfg(test)]
#[path = "host_event_tests.rs"]
mod tests;
