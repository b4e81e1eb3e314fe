// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parser_for_dispatches_to_the_right_framing() {
    let packet = serde_json::json!({
        "ts_ms": 1,
        "src_addr": "10.0.0.1",
        "src_port": 1,
        "dst_addr": "10.0.0.2",
        "dst_port": 2,
        "proto": "udp",
        "length": 10,
        "flow_id": "f",
    });
    let rec = parser_for(Framing::PacketCapture)
        .parse(&serde_json::to_vec(&packet).unwrap())
        .expect("parses");
    assert_eq!(rec.flow_id.0, "f");
}
