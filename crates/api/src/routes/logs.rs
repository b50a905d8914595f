// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The log-reading and analysis family (§4.6, §6): `summary`, `failures`,
//! `successes`, `session`, `log`, `analysis`, `clear`.

use crate::dto::{
    AnalysisResponse, ClearLogsResponse, LogEntryResponse, SessionResponse, SummaryResponse,
};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use isolab_core::{LogEntryKind, LogId, SessionId};
use serde::Deserialize;

const DEFAULT_RECENT_LIMIT: usize = 50;
const DEFAULT_ANALYSIS_LOOKBACK: usize = 200;
const DEFAULT_ANALYSIS_TOP_N: usize = 10;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    limit: Option<usize>,
    unfixed_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    lookback: Option<usize>,
    top_n: Option<usize>,
}

pub async fn summary(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let failures = state.logger.recent(LogEntryKind::Failure, DEFAULT_RECENT_LIMIT, false)?;
    let successes = state.logger.recent(LogEntryKind::Success, DEFAULT_RECENT_LIMIT, false)?;
    Ok(Json(SummaryResponse {
        failures_recent: failures.len(),
        successes_recent: successes.len(),
        errors_total: state.logger.errors_total(),
    }))
}

pub async fn failures(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state.logger.recent(
        LogEntryKind::Failure,
        query.limit.unwrap_or(DEFAULT_RECENT_LIMIT),
        query.unfixed_only.unwrap_or(false),
    )?;
    let body: Vec<LogEntryResponse> = entries.into_iter().map(LogEntryResponse::from).collect();
    Ok(Json(body))
}

pub async fn successes(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state.logger.recent(
        LogEntryKind::Success,
        query.limit.unwrap_or(DEFAULT_RECENT_LIMIT),
        false,
    )?;
    let body: Vec<LogEntryResponse> = entries.into_iter().map(LogEntryResponse::from).collect();
    Ok(Json(body))
}

pub async fn session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = SessionId::from(session_id.as_str());
    let session = state.logger.get_session(&session_id)?;
    Ok(Json(SessionResponse::from(session)))
}

pub async fn log(
    State(state): State<AppState>,
    Path(log_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let log_id = LogId::from(log_id.as_str());
    let entry = state.logger.get_log(&log_id)?;
    Ok(Json(LogEntryResponse::from(entry)))
}

pub async fn analysis(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let analysis = isolab_logger::analyze(
        &state.logger,
        query.lookback.unwrap_or(DEFAULT_ANALYSIS_LOOKBACK),
        query.top_n.unwrap_or(DEFAULT_ANALYSIS_TOP_N),
    )?;
    Ok(Json(AnalysisResponse::from(analysis)))
}

#[derive(Debug, Deserialize)]
pub struct ClearQuery {
    keep_from: String,
}

pub async fn clear(
    State(state): State<AppState>,
    Json(query): Json<ClearQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.logger.clear_logs(&query.keep_from)?;
    Ok(Json(ClearLogsResponse { partitions_removed: removed }))
}
