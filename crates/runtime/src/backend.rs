// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `RuntimeBackend` trait: one capability, "execute a guest program in
//! an ephemeral isolated container, reading a JSON request on stdin,
//! producing files under an output directory, returning exit code plus
//! captured streams."

use crate::isolation::IsolationSpec;
use async_trait::async_trait;
use isolab_core::JobId;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("container failed to start: {0}")]
    NotStarted(String),
    #[error("backend infrastructure error: {0}")]
    Backend(String),
}

/// Why a run did not end in a guest exit being reported normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The guest never started (image pull failure, scheduling failure).
    NotStarted(String),
    /// The guest ran and exited with this code.
    GuestExit(i32),
    /// The deadline elapsed before the guest exited.
    Timeout,
    /// The run was cancelled before the guest exited.
    Cancelled,
    /// An infrastructure fault unrelated to the guest itself.
    BackendError(String),
}

/// Everything a backend needs to run one job.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub job_id: JobId,
    pub image: String,
    pub stdin: String,
    pub code_dir: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub deadline: Duration,
    pub isolation: IsolationSpec,
}

/// What a backend returns after a guest container has fully exited (or
/// been torn down without exiting).
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub failure: Option<FailureKind>,
    /// Set if the guest emitted a `report_failure` marker during the run,
    /// regardless of exit code. Only backends that process the marker
    /// stream live (the local daemon) populate this from the run itself;
    /// others leave it `None` and rely on the caller scanning `stdout`.
    pub reported_failure: Option<String>,
}

impl RunOutcome {
    pub fn guest_exited(exit_code: i32, stdout: String, stderr: String) -> Self {
        Self { exit_code: Some(exit_code), stdout, stderr, failure: None, reported_failure: None }
    }

    pub fn guest_exited_with_report(
        exit_code: i32,
        stdout: String,
        stderr: String,
        reported_failure: Option<String>,
    ) -> Self {
        Self { exit_code: Some(exit_code), stdout, stderr, failure: None, reported_failure }
    }

    pub fn timed_out(stdout: String, stderr: String) -> Self {
        Self { exit_code: None, stdout, stderr, failure: Some(FailureKind::Timeout), reported_failure: None }
    }

    pub fn cancelled(stdout: String, stderr: String) -> Self {
        Self { exit_code: None, stdout, stderr, failure: Some(FailureKind::Cancelled), reported_failure: None }
    }
}

/// Execute a guest program in an ephemeral isolated container.
///
/// Implementations must guarantee container teardown on every return path,
/// including timeout, cancel, and backend error — never leak a running
/// container.
#[async_trait]
pub trait RuntimeBackend: Send + Sync + 'static {
    async fn run(&self, spec: RunSpec) -> Result<RunOutcome, RuntimeError>;

    /// Forcibly terminate a job's container, if still running. Idempotent:
    /// calling it on a job with no live container is not an error.
    async fn cancel(&self, job_id: &JobId) -> Result<(), RuntimeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_exited_carries_no_failure() {
        let outcome = RunOutcome::guest_exited(0, "ok".into(), String::new());
        assert_eq!(outcome.exit_code, Some(0));
        assert!(outcome.failure.is_none());
    }

    #[test]
    fn timed_out_has_no_exit_code() {
        let outcome = RunOutcome::timed_out(String::new(), String::new());
        assert_eq!(outcome.exit_code, None);
        assert_eq!(outcome.failure, Some(FailureKind::Timeout));
    }
}
