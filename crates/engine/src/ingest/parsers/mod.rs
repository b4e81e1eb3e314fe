// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One parser per collector framing (§4.F). Each accepts the raw bytes a
//! collector sends on the wire and yields a [`CommonRecord`], or a
//! [`ParseErrorReason`] the caller counts and drops.

pub mod flow_v1;
pub mod flow_v2;
pub mod host_event;
pub mod packet_capture;

use netdefend_core::error::ParseErrorReason;
use netdefend_core::record::CommonRecord;

/// Which collector framing a raw payload is in. Chosen by the ingest
/// endpoint a collector posted to; never sniffed from the payload itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    PacketCapture,
    FlowV1,
    FlowV2,
    HostEvent,
}

pub trait RecordParser {
    fn parse(&self, raw: &[u8]) -> Result<CommonRecord, ParseErrorReason>;
}

pub fn parser_for(framing: Framing) -> Box<dyn RecordParser + Send + Sync> {
    match framing {
        Framing::PacketCapture => Box::new(packet_capture::PacketCaptureParser),
        Framing::FlowV1 => Box::new(flow_v1::FlowV1Parser),
        Framing::FlowV2 => Box::new(flow_v2::FlowV2Parser),
        Framing::HostEvent => Box::new(host_event::HostEventParser),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
