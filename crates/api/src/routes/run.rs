// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /run` and `POST /cancel/{job_id}` — the engine's observable
//! contract (§4.6).

use crate::dto::RunResponse;
use crate::error::ApiError;
use crate::multipart::parse_submission;
use crate::state::AppState;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use isolab_core::{JobId, JobStatus};

pub async fn run(State(state): State<AppState>, multipart: Multipart) -> Result<impl IntoResponse, ApiError> {
    let submission = parse_submission(multipart).await?;
    let outcome = state.jobs.run(submission).await?;

    let status = match outcome.status {
        JobStatus::Succeeded => StatusCode::OK,
        JobStatus::TimedOut => StatusCode::GATEWAY_TIMEOUT,
        JobStatus::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::CONFLICT),
        _ => StatusCode::BAD_REQUEST,
    };

    let job_id = outcome.job_id;
    let timeout_secs = state.jobs.script_timeout_secs();
    let body = RunResponse::from_outcome(outcome, timeout_secs, move |name| format!("/outputs/{job_id}/{name}"));
    Ok((status, Json(body)))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = JobId::from(job_id.as_str());
    state.jobs.cancel(&job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
