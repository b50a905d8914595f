// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /version`, `GET /health`.

use crate::dto::{HealthResponse, VersionResponse};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;

pub async fn version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        runtime: state.runtime_label.clone(),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        errors_total: state.logger.errors_total(),
    })
}
