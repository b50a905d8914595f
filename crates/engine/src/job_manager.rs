// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Job Manager: drives a single job end to end (§4.3).
//!
//! Grounded in the teacher's `Executor::execute` idiom (`crates/engine/src/
//! executor.rs`): a thin, traced/timed wrapper over an `execute_inner` that
//! does the actual work, so every job's dispatch is observable the same way
//! regardless of what it ends up doing.

use crate::diagnostic_response::DiagnosticMode;
use crate::error::EngineError;
use crate::harvest;
use crate::image_library::ImageLibrary;
use crate::request_builder;
use crate::submission::Submission;
use crate::workspace_materializer::{self, STAGED_IMAGE_FILENAME};
use isolab_core::{
    Clock, EngineConfig, Job, JobId, JobStatus, RunResult, SessionId, SystemClock, Workspace,
};
use isolab_logger::{LogStore, NewAttempt};
use isolab_runtime::backend::{FailureKind, RunSpec};
use isolab_runtime::{IsolationSpec, RuntimeBackend};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// What `JobManager::run` hands back to the admission layer: the harvested
/// result plus whatever diagnostic-mode transition happened this attempt.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub session_id: SessionId,
    pub log_id: isolab_core::LogId,
    pub status: JobStatus,
    pub result: RunResult,
    pub diagnostic_mode: Option<DiagnosticMode>,
}

struct PendingContext {
    image_bytes: Option<Vec<u8>>,
    script_parameters: String,
    user_prompt: Option<String>,
    ai_model: Option<String>,
    inject_debug: bool,
}

pub struct JobManager<C: Clock = SystemClock> {
    backend: Arc<dyn RuntimeBackend>,
    logger: Arc<LogStore>,
    image_library: Arc<dyn ImageLibrary>,
    config: EngineConfig,
    clock: C,
    jobs: Arc<Mutex<HashMap<JobId, (Job, PendingContext)>>>,
    cancelled: Arc<Mutex<HashSet<JobId>>>,
    semaphore: Arc<Semaphore>,
    workspace_root: std::path::PathBuf,
}

impl JobManager<SystemClock> {
    pub fn new(
        backend: Arc<dyn RuntimeBackend>,
        logger: Arc<LogStore>,
        image_library: Arc<dyn ImageLibrary>,
        config: EngineConfig,
        workspace_root: std::path::PathBuf,
    ) -> Self {
        Self::with_clock(backend, logger, image_library, config, workspace_root, SystemClock)
    }
}

impl<C: Clock> JobManager<C> {
    pub fn with_clock(
        backend: Arc<dyn RuntimeBackend>,
        logger: Arc<LogStore>,
        image_library: Arc<dyn ImageLibrary>,
        config: EngineConfig,
        workspace_root: std::path::PathBuf,
        clock: C,
    ) -> Self {
        let max_concurrent_jobs = config.max_concurrent_jobs;
        Self {
            backend,
            logger,
            image_library,
            clock,
            semaphore: Arc::new(Semaphore::new(max_concurrent_jobs)),
            jobs: Arc::new(Mutex::new(HashMap::new())),
            cancelled: Arc::new(Mutex::new(HashSet::new())),
            workspace_root,
            config,
        }
    }

    /// Resolve the input image per the admission resolution order (§4.6):
    /// uploaded bytes, then a library reference, then none.
    fn resolve_image(&self, submission: &Submission) -> Option<Vec<u8>> {
        if let Some(bytes) = &submission.image_bytes {
            return Some(bytes.clone());
        }
        if let Some(reference) = &submission.image_ref {
            return self.image_library.resolve(reference);
        }
        None
    }

    /// The workspace directory a job's artifacts live under, stable for the
    /// job's whole lifetime (including after it finishes) so the admission
    /// layer can serve `GET /outputs/{job_id}/...` without keeping its own
    /// bookkeeping.
    /// The configured per-script deadline, in seconds. Surfaced to the
    /// admission layer so a timed-out response can report the deadline it
    /// hit (§4.6).
    pub fn script_timeout_secs(&self) -> u64 {
        self.config.script_timeout_secs
    }

    pub fn workspace_path_for(&self, job_id: &JobId) -> std::path::PathBuf {
        self.workspace_root.join(job_id.to_string())
    }

    /// Allocate a job in the `pending` state. Atomic: the job is visible to
    /// `cancel`/`execute` the moment this returns.
    ///
    /// The job id is minted here, before `Job::new`, so the workspace
    /// directory can be named after it directly rather than a throwaway
    /// counter the admission layer would have no way to recover later.
    pub fn submit(&self, submission: Submission) -> (JobId, SessionId) {
        let session_id = submission.session_id.unwrap_or_else(SessionId::new);
        let image_bytes = self.resolve_image(&submission);
        let job_id = JobId::new();
        let workspace_path = self.workspace_path_for(&job_id);
        let submitted_at_ms = self.clock.epoch_ms();

        let job = Job {
            id: job_id,
            session_id,
            previous_attempt_id: submission.previous_attempt_id,
            user_id: submission.user_id.clone(),
            source_code: submission.source_code.clone(),
            status: JobStatus::Pending,
            workspace_path,
            submitted_at_ms,
            started_at_ms: None,
            finished_at_ms: None,
            deadline_ms: submitted_at_ms + self.config.script_timeout_secs.saturating_mul(1000),
            diagnostic_mode: false,
        };

        let context = PendingContext {
            image_bytes,
            script_parameters: submission.script_parameters.clone().unwrap_or_else(|| "{}".to_string()),
            user_prompt: submission.user_prompt.clone(),
            ai_model: submission.ai_model.clone(),
            inject_debug: submission.inject_debug,
        };

        self.jobs.lock().insert(job_id, (job, context));
        (job_id, session_id)
    }

    /// Submit and run a job to completion in one call — the shape the
    /// admission layer's synchronous `POST /run` actually needs.
    pub async fn run(&self, submission: Submission) -> Result<JobOutcome, EngineError> {
        let (job_id, _session_id) = self.submit(submission);
        self.execute(job_id).await
    }

    /// Request cancellation. Idempotent; safe to call on a job that has
    /// already finished or that does not exist.
    pub async fn cancel(&self, job_id: &JobId) -> Result<(), EngineError> {
        self.cancelled.lock().insert(*job_id);
        self.backend.cancel(job_id).await?;
        Ok(())
    }

    fn is_cancelled(&self, job_id: &JobId) -> bool {
        self.cancelled.lock().contains(job_id)
    }

    /// Run a pending job end to end: materialize workspace, build the
    /// request, optionally instrument, invoke the backend, harvest outputs,
    /// log the outcome. Traced and timed the way the teacher's `Executor`
    /// wraps every effect.
    pub async fn execute(&self, job_id: JobId) -> Result<JobOutcome, EngineError> {
        let _permit = self
            .semaphore
            .clone()
            .try_acquire_owned()
            .map_err(|_| EngineError::TooBusy)?;

        let start = Instant::now();
        let result = self.execute_inner(job_id).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(outcome) => {
                tracing::info!(job_id = %job_id, success = outcome.result.succeeded(), elapsed_ms, "job executed")
            }
            Err(e) => tracing::error!(job_id = %job_id, error = %e, elapsed_ms, "job failed"),
        }
        result
    }

    async fn execute_inner(&self, job_id: JobId) -> Result<JobOutcome, EngineError> {
        let (mut job, context) = {
            let mut jobs = self.jobs.lock();
            jobs.remove(&job_id).ok_or_else(|| EngineError::JobNotFound(job_id.to_string()))?
        };
        if job.is_terminal() {
            return Err(EngineError::AlreadyTerminal(job_id.to_string()));
        }

        job.start(self.config.script_timeout_secs, &self.clock);

        // Reject an oversized request before anything touches the filesystem.
        if context.script_parameters.len() > isolab_protocol::request::MAX_SCRIPT_PARAMETERS_BYTES {
            return Err(EngineError::ParametersTooLarge);
        }

        let prior_session = self.logger.get_session(&job.session_id).ok();
        let consecutive_failures = prior_session.as_ref().map(|s| s.consecutive_failures()).unwrap_or(0);
        let offer_instrumentation = isolab_diagnostics::should_offer_instrumentation(
            consecutive_failures,
            self.config.diagnostic_failure_threshold,
        );
        let apply_injection = context.inject_debug && offer_instrumentation;

        let guest_source = if apply_injection {
            isolab_diagnostics::inject(&job.source_code)
        } else {
            job.source_code.clone()
        };
        job.diagnostic_mode = apply_injection;

        let workspace = Workspace::new(job.workspace_path.clone());
        workspace_materializer::materialize(&workspace, &guest_source, context.image_bytes.as_deref())?;

        let has_image = context.image_bytes.is_some();
        let request = request_builder::build(&job.id, &context.script_parameters, has_image);
        let request_json = serde_json::to_string(&request).map_err(|e| {
            EngineError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
        })?;

        let deadline = if job.deadline_ms <= self.clock.epoch_ms() {
            Duration::ZERO
        } else {
            Duration::from_millis(job.deadline_ms - self.clock.epoch_ms())
        };

        let run_spec = RunSpec {
            job_id: job.id,
            image: self.config.runner_image.clone(),
            stdin: request_json,
            code_dir: workspace.code_dir(),
            input_dir: workspace.input_dir(),
            output_dir: workspace.output_dir(),
            deadline,
            isolation: IsolationSpec::default(),
        };

        let outcome = if deadline.is_zero() {
            isolab_runtime::backend::RunOutcome::timed_out(String::new(), String::new())
        } else {
            self.backend.run(run_spec).await?
        };

        let cancelled = self.is_cancelled(&job_id);
        let (status, output_files, reported_failure_for_result) = if cancelled {
            (JobStatus::Cancelled, Vec::new(), None)
        } else {
            match outcome.failure {
                Some(FailureKind::Timeout) => (JobStatus::TimedOut, Vec::new(), None),
                Some(FailureKind::Cancelled) => (JobStatus::Cancelled, Vec::new(), None),
                Some(FailureKind::NotStarted(_)) | Some(FailureKind::BackendError(_)) => {
                    (JobStatus::Failed, Vec::new(), None)
                }
                None => {
                    let exit_code = outcome.exit_code.unwrap_or(1);
                    let reported = outcome.reported_failure.clone().or_else(|| {
                        find_report_failure(&outcome.stdout)
                    });
                    let files = harvest::harvest(&workspace.output_dir())?;
                    let status = if exit_code == 0 && reported.is_none() {
                        JobStatus::Succeeded
                    } else {
                        JobStatus::Failed
                    };
                    (status, files, reported)
                }
            }
        };

        job.finish(status, &self.clock);

        let duration = job
            .finished_at_ms
            .zip(job.started_at_ms)
            .map(|(end, start)| Duration::from_millis(end.saturating_sub(start)))
            .unwrap_or_default();

        let run_result = RunResult {
            return_code: outcome.exit_code.unwrap_or(-1),
            stdout: outcome.stdout.clone(),
            stderr: outcome.stderr.clone(),
            output_files,
            duration,
            reported_failure: reported_failure_for_result,
        };

        let diagnostic_mode = self.diagnostic_mode_report(
            apply_injection,
            &job.source_code,
            run_result.succeeded(),
        );

        let code_hash = hex_sha256(&job.source_code);
        let log_entry = self.logger.log_attempt(NewAttempt {
            job_id: job.id,
            session_id: job.session_id,
            previous_attempt_id: job.previous_attempt_id,
            timestamp_ms: job.finished_at_ms.unwrap_or_else(|| self.clock.epoch_ms()),
            outcome: if run_result.succeeded() { isolab_core::Outcome::Success } else { isolab_core::Outcome::Failure },
            code_hash,
            user_prompt: context.user_prompt,
            ai_model: context.ai_model,
            stderr: if run_result.stderr.is_empty() { None } else { Some(run_result.stderr.clone()) },
            exit_was_timeout: status == JobStatus::TimedOut,
            diagnostic_mode: job.diagnostic_mode,
        });

        // A logger failure must never abort the job itself (§4.4).
        let log_id = match log_entry {
            Ok(entry) => entry.log_id,
            Err(_) => isolab_core::LogId::new(),
        };

        Ok(JobOutcome { job_id: job.id, session_id: job.session_id, log_id, status, result: run_result, diagnostic_mode })
    }

    fn diagnostic_mode_report(
        &self,
        applied_this_run: bool,
        submitted_source: &str,
        succeeded: bool,
    ) -> Option<DiagnosticMode> {
        if applied_this_run {
            return Some(DiagnosticMode::Activated {
                message: "diagnostic instrumentation activated for this attempt".to_string(),
            });
        }
        if succeeded && isolab_diagnostics::contains_sentinel(submitted_source) {
            return Some(DiagnosticMode::Deactivated {
                message: "diagnostic instrumentation deactivated after a successful run".to_string(),
                cleaned_code: isolab_diagnostics::strip(submitted_source),
            });
        }
        None
    }
}

/// The file name staged image bytes land under, re-exported here so callers
/// assembling `output_files` URLs for a staged upload don't reach into
/// `workspace_materializer` directly.
pub const STAGED_IMAGE_NAME: &str = STAGED_IMAGE_FILENAME;

/// Scan captured stdout for a `report_failure` marker, for backends (the
/// cluster orchestrator) that only return output after the guest exits
/// rather than processing markers live.
fn find_report_failure(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let marker = isolab_protocol::Marker::parse(line).ok()?;
        if marker.name != isolab_protocol::MarkerName::ReportFailure {
            return None;
        }
        marker.args.get("message").and_then(serde_json::Value::as_str).map(str::to_string)
    })
}

fn hex_sha256(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use isolab_core::FakeClock;
    use isolab_runtime::backend::{RunOutcome, RuntimeError};
    use tempfile::tempdir;

    struct StubBackend {
        exit_code: i32,
        stderr: &'static str,
    }

    impl StubBackend {
        fn succeeding() -> Self {
            Self { exit_code: 0, stderr: "" }
        }

        fn failing() -> Self {
            Self { exit_code: 1, stderr: "ValueError: bad input" }
        }
    }

    #[async_trait]
    impl RuntimeBackend for StubBackend {
        async fn run(&self, _spec: RunSpec) -> Result<RunOutcome, RuntimeError> {
            Ok(RunOutcome::guest_exited(self.exit_code, "ok".to_string(), self.stderr.to_string()))
        }

        async fn cancel(&self, _job_id: &JobId) -> Result<(), RuntimeError> {
            Ok(())
        }
    }

    fn manager(backend: Arc<dyn RuntimeBackend>, root: &std::path::Path) -> JobManager<FakeClock> {
        let logger = Arc::new(LogStore::new(root.join("logs")));
        let library = Arc::new(crate::image_library::InMemoryImageLibrary::new());
        let config = EngineConfig {
            runtime: isolab_core::RuntimeKind::LocalDaemon,
            runner_image: "isolab-runner:latest".to_string(),
            script_timeout_secs: 600,
            kubernetes_namespace: "default".to_string(),
            host_project_dir: None,
            bind_addr: "0.0.0.0:0".to_string(),
            log_store_dir: root.join("logs"),
            max_concurrent_jobs: 1,
            diagnostic_failure_threshold: 2,
            output_retention_secs: 86_400,
        };
        JobManager::with_clock(backend, logger, library, config, root.join("workspaces"), FakeClock::new())
    }

    fn submission(source: &str) -> Submission {
        Submission {
            source_code: source.to_string(),
            image_bytes: None,
            image_ref: None,
            user_id: None,
            session_id: None,
            previous_attempt_id: None,
            user_prompt: None,
            ai_model: None,
            inject_debug: false,
            script_parameters: None,
        }
    }

    #[tokio::test]
    async fn a_successful_job_harvests_no_outputs_when_none_were_written() {
        let dir = tempdir().expect("tempdir");
        let manager = manager(Arc::new(StubBackend::succeeding()), dir.path());
        let outcome = manager.run(submission("print('hi')")).await.expect("run");
        assert!(outcome.result.succeeded());
        assert!(outcome.result.output_files.is_empty());
        assert!(outcome.diagnostic_mode.is_none());
    }

    #[tokio::test]
    async fn a_failing_job_is_logged_and_not_reported_as_success() {
        let dir = tempdir().expect("tempdir");
        let manager = manager(Arc::new(StubBackend::failing()), dir.path());
        let outcome = manager.run(submission("raise ValueError()")).await.expect("run");
        assert!(!outcome.result.succeeded());
        assert_eq!(outcome.result.return_code, 1);
    }

    #[tokio::test]
    async fn third_attempt_after_two_prior_failures_activates_instrumentation_when_opted_in() {
        let dir = tempdir().expect("tempdir");
        let manager = manager(Arc::new(StubBackend::failing()), dir.path());
        let session_id = SessionId::new();

        let mut first = submission("raise ValueError()");
        first.session_id = Some(session_id);
        manager.run(first).await.expect("first run");

        let mut second = submission("raise ValueError()");
        second.session_id = Some(session_id);
        let outcome = manager.run(second).await.expect("second run");
        assert!(outcome.diagnostic_mode.is_none(), "threshold not yet reached");

        let mut third = submission("raise ValueError()");
        third.session_id = Some(session_id);
        third.inject_debug = true;
        let outcome = manager.run(third).await.expect("third run");

        assert!(matches!(outcome.diagnostic_mode, Some(DiagnosticMode::Activated { .. })));
    }

    #[tokio::test]
    async fn too_busy_when_the_concurrency_cap_is_already_saturated() {
        let dir = tempdir().expect("tempdir");
        let manager = manager(Arc::new(StubBackend::succeeding()), dir.path());
        let _permit = manager.semaphore.clone().try_acquire_owned().expect("acquire");
        let (job_id, _) = manager.submit(submission("print('hi')"));
        let err = manager.execute(job_id).await.unwrap_err();
        assert!(matches!(err, EngineError::TooBusy));
    }
}
