// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "first_switched_ms": 1_700_000_000_000i64,
        "last_switched_ms": 1_700_000_030_000i64,
        "src_addr": "10.0.0.1",
        "src_port": 51234,
        "dst_addr": "10.0.0.2",
        "dst_port": 443,
        "protocol_number": 6,
        "bytes_in": 900,
        "bytes_out": 4500,
        "pkts_in": 6,
        "pkts_out": 9,
        "tcp_flags_bitmask": 0x12,
        "flow_id": "flow-xyz",
        "exporter_id": "exp-1",
    }))
    .unwrap()
}

#[test]
fn parses_well_formed_flow() {
    let rec = FlowV1Parser.parse(&sample()).expect("parses");
    assert_eq!(rec.protocol, Protocol::Tcp);
    assert_eq!(rec.fwd.bytes, 4500);
    assert_eq!(rec.rev.bytes, 900);
    assert_eq!(rec.tcp_flags.syn, 1);
    assert_eq!(rec.tcp_flags.ack, 1);
    assert_eq!(rec.tcp_flags.fin, 0);
}

#[test]
fn end_before_start_is_bad_field_encoding() {
    let mut v: serde_json::Value = serde_json::from_slice(&sample()).unwrap();
    v["last_switched_ms"] = serde_json::json!(1);
    let err = FlowV1Parser.parse(&serde_json::to_vec(&v).unwrap()).unwrap_err();
    assert_eq!(err, ParseErrorReason::BadFieldEncoding);
}

#[test]
fn unknown_protocol_number_becomes_other() {
    let mut v: serde_json::Value = serde_json::from_slice(&sample()).unwrap();
    v["protocol_number"] = serde_json::json!(47);
    let rec = FlowV1Parser.parse(&serde_json::to_vec(&v).unwrap()).expect("parses");
    assert_eq!(rec.protocol, Protocol::Other(47));
}
