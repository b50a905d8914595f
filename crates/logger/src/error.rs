// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("log storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("log record serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no log record found for id {0}")]
    LogNotFound(String),
    #[error("no session found for id {0}")]
    SessionNotFound(String),
}
