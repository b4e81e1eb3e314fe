// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-packet capture framing: one JSON object per observed packet.
//! `t_start == t_end` since a packet has no duration of its own; the
//! feature engine's windowing is what turns a stream of these into
//! aggregates.

use std::net::IpAddr;

use netdefend_core::error::ParseErrorReason;
use netdefend_core::ids::{FlowId, SensorId};
use netdefend_core::record::{
    CommonRecord, DirectionCounts, Protocol, SourceMeta, TcpFlagCounts,
};
use serde::Deserialize;

use super::RecordParser;

#[derive(Debug, Deserialize)]
struct WirePacket {
    ts_ms: i64,
    src_addr: IpAddr,
    src_port: u16,
    dst_addr: IpAddr,
    dst_port: u16,
    proto: String,
    length: u32,
    /// Direction relative to `src_addr`: true if this packet is part of
    /// the reply (server→client) leg.
    #[serde(default)]
    is_reply: bool,
    #[serde(default)]
    tcp_flags: Option<WireTcpFlags>,
    flow_id: String,
    #[serde(default)]
    sensor_id: Option<String>,
    #[serde(default)]
    capture_origin: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WireTcpFlags {
    #[serde(default)]
    syn: bool,
    #[serde(default)]
    ack: bool,
    #[serde(default)]
    fin: bool,
    #[serde(default)]
    rst: bool,
    #[serde(default)]
    psh: bool,
    #[serde(default)]
    urg: bool,
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

pub struct PacketCaptureParser;

impl RecordParser for PacketCaptureParser {
    fn parse(&self, raw: &[u8]) -> Result<CommonRecord, ParseErrorReason> {
        if raw.is_empty() {
            return Err(ParseErrorReason::ZeroLengthRecord);
        }
        let wire: WirePacket =
            serde_json::from_slice(raw).map_err(|_| ParseErrorReason::BadFieldEncoding)?;

        if wire.flow_id.is_empty() {
            return Err(ParseErrorReason::TruncatedHeader);
        }
        let protocol = protocol_from_str(&wire.proto)?;

        let flags = wire.tcp_flags.unwrap_or_default();
        let tcp_flags = TcpFlagCounts {
            syn: flags.syn as u32,
            ack: flags.ack as u32,
            fin: flags.fin as u32,
            rst: flags.rst as u32,
            psh: flags.psh as u32,
            urg: flags.urg as u32,
        };

        let (fwd, rev) = if wire.is_reply {
            (DirectionCounts::default(), DirectionCounts { bytes: wire.length as u64, packets: 1 })
        } else {
            (DirectionCounts { bytes: wire.length as u64, packets: 1 }, DirectionCounts::default())
        };

        let source = wire.sensor_id.map(|sensor_id| SourceMeta {
            sensor_id: SensorId(sensor_id),
            capture_origin: wire.capture_origin.unwrap_or_else(|| "pcap".to_string()),
        });

        Ok(CommonRecord {
            t_start: wire.ts_ms,
            t_end: wire.ts_ms,
            src_addr: wire.src_addr,
            src_port: wire.src_port,
            dst_addr: wire.dst_addr,
            dst_port: wire.dst_port,
            protocol,
            fwd,
            rev,
            tcp_flags,
            flow_id: FlowId(wire.flow_id),
            source,
        })
    }
}

#[cfg(test)]
#[path = "packet_capture_tests.rs"]
mod tests;
