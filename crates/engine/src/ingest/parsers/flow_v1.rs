// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow-record framing #1: NetFlow/IPFIX-style field naming
//! (`first_switched`/`last_switched`, `in`/`out` counters).

use std::net::IpAddr;

use netdefend_core::error::ParseErrorReason;
use netdefend_core::ids::{FlowId, SensorId};
use netdefend_core::record::{
    CommonRecord, DirectionCounts, Protocol, SourceMeta, TcpFlagCounts,
};
use serde::Deserialize;

use super::RecordParser;

#[derive(Debug, Deserialize)]
struct WireFlowV1 {
    first_switched_ms: i64,
    last_switched_ms: i64,
    src_addr: IpAddr,
    src_port: u16,
    dst_addr: IpAddr,
    dst_port: u16,
    protocol_number: u8,
    bytes_in: u64,
    bytes_out: u64,
    pkts_in: u64,
    pkts_out: u64,
    #[serde(default)]
    tcp_flags_bitmask: Option<u8>,
    flow_id: String,
    #[serde(default)]
    exporter_id: Option<String>,
}

const FLAG_FIN: u8 = 0x01;
const FLAG_SYN: u8 = 0x02;
const FLAG_RST: u8 = 0x04;
const FLAG_PSH: u8 = 0x08;
const FLAG_ACK: u8 = 0x10;
const FLAG_URG: u8 = 0x20;

fn protocol_from_number(n: u8) -> Protocol {
    match n {
        6 => Protocol::Tcp,
        17 => Protocol::Udp,
        1 => Protocol::Icmp,
        other => Protocol::Other(other),
    }
}

fn flags_from_bitmask(mask: u8) -> TcpFlagCounts {
    TcpFlagCounts {
        syn: (mask & FLAG_SYN != 0) as u32,
        ack: (mask & FLAG_ACK != 0) as u32,
        fin: (mask & FLAG_FIN != 0) as u32,
        rst: (mask & FLAG_RST != 0) as u32,
        psh: (mask & FLAG_PSH != 0) as u32,
        urg: (mask & FLAG_URG != 0) as u32,
    }
}

pub struct FlowV1Parser;

impl RecordParser for FlowV1Parser {
    fn parse(&self, raw: &[u8]) -> Result<CommonRecord, ParseErrorReason> {
        if raw.is_empty() {
            return Err(ParseErrorReason::ZeroLengthRecord);
        }
        let wire: WireFlowV1 =
            serde_json::from_slice(raw).map_err(|_| ParseErrorReason::BadFieldEncoding)?;

        if wire.flow_id.is_empty() {
            return Err(ParseErrorReason::TruncatedHeader);
        }
        if wire.last_switched_ms < wire.first_switched_ms {
            return Err(ParseErrorReason::BadFieldEncoding);
        }

        let tcp_flags = wire.tcp_flags_bitmask.map(flags_from_bitmask).unwrap_or_default();
        let source = wire.exporter_id.map(|sensor_id| SourceMeta {
            sensor_id: SensorId(sensor_id),
            capture_origin: "flow_v1".to_string(),
        });

        Ok(CommonRecord {
            t_start: wire.first_switched_ms,
            t_end: wire.last_switched_ms,
            src_addr: wire.src_addr,
            src_port: wire.src_port,
            dst_addr: wire.dst_addr,
            dst_port: wire.dst_port,
            protocol: protocol_from_number(wire.protocol_number),
            fwd: DirectionCounts { bytes: wire.bytes_out, packets: wire.pkts_out },
            rev: DirectionCounts { bytes: wire.bytes_in, packets: wire.pkts_in },
            tcp_flags,
            flow_id: FlowId(wire.flow_id),
            source,
        })
    }
}

#[cfg(test)]
#[path = "flow_v1_tests.rs"]
mod tests;
