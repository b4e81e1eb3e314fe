// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous HTTP surfaces (§6) over the same engine components the
//! background pipeline (§4) drives.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

pub use error::ApiError;
pub use crate::pipeline::EngineState;

pub fn build_router(state: Arc<EngineState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/stats", get(handlers::stats))
        .route("/api/v1/ingest/{framing}", post(handlers::ingest))
        .route("/api/v1/detect", post(handlers::detect))
        .route("/api/v1/decide", post(handlers::decide))
        .route("/api/v1/apply", post(handlers::apply))
        .route("/api/v1/rollback/{rule_id}", post(handlers::rollback))
        .route("/api/v1/rules", get(handlers::list_rules))
        .route("/api/v1/audit/{id}", get(handlers::get_audit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
