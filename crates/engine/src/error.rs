// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level error taxonomy. The Job Manager converts every lower-level
//! error (runtime, workspace, logger) into one of these variants before it
//! reaches the admission layer.

use isolab_core::WorkspaceError;
use isolab_runtime::RuntimeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown job: {0}")]
    JobNotFound(String),
    #[error("job {0} is already terminal")]
    AlreadyTerminal(String),
    #[error("at capacity")]
    TooBusy,
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
    #[error("runtime backend error: {0}")]
    Backend(#[from] RuntimeError),
    #[error("request exceeds the script_parameters size budget")]
    ParametersTooLarge,
}
