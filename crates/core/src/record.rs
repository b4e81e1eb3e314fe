// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The normalized record that F emits and everything downstream consumes
//! (§3 "CommonRecord").

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::ids::{FlowId, SensorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Other(u8),
}

/// Counts in one direction of a flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionCounts {
    pub bytes: u64,
    pub packets: u64,
}

/// TCP flag counts observed over the record's time range. Zeroed for
/// non-TCP protocols.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TcpFlagCounts {
    pub syn: u32,
    pub ack: u32,
    pub fin: u32,
    pub rst: u32,
    pub psh: u32,
    pub urg: u32,
}

/// Capture origin, retained for traceback and adapter selection but never
/// used for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMeta {
    pub sensor_id: SensorId,
    pub capture_origin: String,
}

/// A normalized flow/event record, immutable after creation (§3).
///
/// `t_start`/`t_end` are Unix milliseconds. `t_end` is the field used for
/// window assignment and closure (§4.E, §9's resolved ambiguity) — never
/// wall-clock, except for session-gap timeouts which are wall-clock by
/// definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonRecord {
    pub t_start: i64,
    pub t_end: i64,
    pub src_addr: IpAddr,
    pub src_port: u16,
    pub dst_addr: IpAddr,
    pub dst_port: u16,
    pub protocol: Protocol,
    pub fwd: DirectionCounts,
    pub rev: DirectionCounts,
    pub tcp_flags: TcpFlagCounts,
    pub flow_id: FlowId,
    pub source: Option<SourceMeta>,
}

impl CommonRecord {
    /// The `(sensor_id, flow_id, t_end)` dedup key from §4.F.
    pub fn dedup_key(&self) -> (String, String, i64) {
        let sensor = self
            .source
            .as_ref()
            .map(|s| s.sensor_id.0.clone())
            .unwrap_or_else(|| "unknown".to_string());
        (sensor, self.flow_id.0.clone(), self.t_end)
    }

    pub fn total_bytes(&self) -> u64 {
        self.fwd.bytes + self.rev.bytes
    }

    pub fn total_packets(&self) -> u64 {
        self.fwd.packets + self.rev.packets
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
