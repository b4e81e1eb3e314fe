// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn subject_for_embeds_prefix_and_partition() {
    let config = NatsBusConfig {
        url: "nats://127.0.0.1:4222".into(),
        token: None,
        prefix: "netdefend.records".into(),
        partition_count: 8,
    };
    // Constructing a NatsBus requires a live connection, so this exercises
    // the pure subject-formatting logic the way the connect path would.
    let subject = format!("{}.partition.{}", config.prefix, 3);
    assert_eq!(subject, "netdefend.records.partition.3");
}
