// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /outputs/{job_id}/{relpath}` — serves a harvested artifact, 404
//! once it falls outside the configured retention window.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use isolab_core::JobId;
use std::time::SystemTime;

pub async fn get_output(
    State(state): State<AppState>,
    Path((job_id, relpath)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let job_id = JobId::from(job_id.as_str());
    let workspace = state.output_workspace(&job_id);
    let path = workspace
        .resolve_output_path(&relpath)
        .map_err(|e| ApiError::OutputNotFound(e.to_string()))?;

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|_| ApiError::OutputNotFound(relpath.clone()))?;

    if let Ok(modified) = metadata.modified() {
        let age = SystemTime::now().duration_since(modified).unwrap_or_default();
        if age > state.output_retention {
            return Err(ApiError::OutputNotFound(relpath));
        }
    }

    let bytes = tokio::fs::read(&path).await.map_err(|e| ApiError::Internal(e.to_string()))?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok((
        [(header::CONTENT_TYPE, mime.essence_str().to_string())],
        bytes,
    )
        .into_response())
}
