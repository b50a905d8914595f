// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! isolab-api: the Admission Front-End (§4.6). A thin HTTP layer over
//! `isolab-engine`'s Job Manager — this crate owns request parsing,
//! response shaping, and process lifetime; it contains no sandboxing logic
//! of its own.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod dto;
pub mod error;
pub mod multipart;
pub mod routes;
pub mod state;

pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Assemble the full HTTP surface (§6) over a constructed `AppState`. Kept
/// separate from `main` so integration tests can drive the router directly
/// without binding a socket.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/run", post(routes::run::run))
        .route("/cancel/:job_id", post(routes::run::cancel))
        .route("/outputs/:job_id/*relpath", get(routes::outputs::get_output))
        .route("/logs/summary", get(routes::logs::summary))
        .route("/logs/failures", get(routes::logs::failures))
        .route("/logs/successes", get(routes::logs::successes))
        .route("/logs/session/:id", get(routes::logs::session))
        .route("/logs/log/:id", get(routes::logs::log))
        .route("/logs/analysis", get(routes::logs::analysis))
        .route("/logs/clear", post(routes::logs::clear))
        .route("/version", get(routes::meta::version))
        .route("/health", get(routes::meta::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
