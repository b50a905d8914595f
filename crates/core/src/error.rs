// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors shared at crate boundaries. Per-crate error enums (in `runtime`,
//! `engine`, `logger`, `api`) live in their own crates and convert into one
//! another explicitly; this module only holds what `core` itself can fail
//! to do, namely build [`crate::config::EngineConfig`].

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
    #[error("{var} must be greater than zero, got {value}")]
    MustBePositive { var: &'static str, value: u64 },
}
