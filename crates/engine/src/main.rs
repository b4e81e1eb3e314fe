// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use netdefend_engine::config::{init_tracing, Config};

#[tokio::main]
async fn main() {
    let config = Config::parse();
    init_tracing(&config);

    if let Err(e) = config.validate() {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }

    if let Err(e) = netdefend_engine::pipeline::run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
