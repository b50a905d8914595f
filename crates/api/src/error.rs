// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP-facing error taxonomy (§7). The Job Manager already collapses
//! backend/workspace/io failures into `EngineError`; this module only adds
//! the admission-specific variants (malformed multipart, unknown route
//! params) and maps everything to a status code and JSON body.

use crate::dto::ErrorBody;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use isolab_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("malformed multipart body: {0}")]
    BadMultipart(String),
    #[error("unknown job: {0}")]
    JobNotFound(String),
    #[error("unknown session: {0}")]
    SessionNotFound(String),
    #[error("unknown log: {0}")]
    LogNotFound(String),
    #[error("output not found: {0}")]
    OutputNotFound(String),
    #[error("at capacity")]
    TooBusy,
    #[error("runtime backend error: {0}")]
    Backend(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::JobNotFound(id) => ApiError::JobNotFound(id),
            EngineError::AlreadyTerminal(id) => ApiError::JobNotFound(id),
            EngineError::TooBusy => ApiError::TooBusy,
            EngineError::ParametersTooLarge => {
                ApiError::BadMultipart("script_parameters exceeds the 64 KiB budget".to_string())
            }
            EngineError::Workspace(err) => ApiError::Internal(err.to_string()),
            EngineError::Io(err) => ApiError::Internal(err.to_string()),
            EngineError::Backend(err) => ApiError::Backend(err.to_string()),
        }
    }
}

impl From<isolab_logger::LoggerError> for ApiError {
    fn from(e: isolab_logger::LoggerError) -> Self {
        match e {
            isolab_logger::LoggerError::SessionNotFound(id) => ApiError::SessionNotFound(id),
            isolab_logger::LoggerError::LogNotFound(id) => ApiError::LogNotFound(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) | ApiError::BadMultipart(_) => StatusCode::BAD_REQUEST,
            ApiError::JobNotFound(_) | ApiError::SessionNotFound(_) | ApiError::LogNotFound(_) | ApiError::OutputNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::TooBusy => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody { error: self.to_string() };
        (self.status(), Json(body)).into_response()
    }
}
