// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and state machine.
//!
//! A job is one execution attempt of a guest program. It moves through a
//! strictly one-way state machine: `pending -> running -> {terminal}`.

use crate::clock::Clock;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a job instance.
    pub struct JobId("job-");
}

/// Lifecycle state of a job. Transitions are one-way; once a terminal
/// variant is reached the job never changes state again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl JobStatus {
    /// Terminal states never transition further.
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Running)
    }
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        TimedOut => "timed_out",
        Cancelled => "cancelled",
    }
}

/// A single submitted execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub session_id: SessionId,
    pub previous_attempt_id: Option<JobId>,
    pub user_id: Option<String>,
    pub source_code: String,
    pub status: JobStatus,
    pub workspace_path: PathBuf,
    pub submitted_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
    /// Wall-clock deadline in epoch milliseconds; exceeding it is a timeout.
    pub deadline_ms: u64,
    pub diagnostic_mode: bool,
}

impl Job {
    /// Create a newly submitted job in the `pending` state.
    pub fn new(
        session_id: SessionId,
        source_code: String,
        workspace_path: PathBuf,
        timeout_secs: u64,
        clock: &impl Clock,
    ) -> Self {
        let submitted_at_ms = clock.epoch_ms();
        Self {
            id: JobId::new(),
            session_id,
            previous_attempt_id: None,
            user_id: None,
            source_code,
            status: JobStatus::Pending,
            workspace_path,
            submitted_at_ms,
            started_at_ms: None,
            finished_at_ms: None,
            deadline_ms: submitted_at_ms + timeout_secs.saturating_mul(1000),
            diagnostic_mode: false,
        }
    }

    /// Transition `pending -> running`, recording the start time and a
    /// fresh deadline measured from that moment.
    pub fn start(&mut self, timeout_secs: u64, clock: &impl Clock) {
        debug_assert_eq!(self.status, JobStatus::Pending);
        let now = clock.epoch_ms();
        self.started_at_ms = Some(now);
        self.deadline_ms = now + timeout_secs.saturating_mul(1000);
        self.status = JobStatus::Running;
    }

    /// Transition into a terminal state. No-op if already terminal.
    pub fn finish(&mut self, status: JobStatus, clock: &impl Clock) {
        if self.status.is_terminal() {
            return;
        }
        debug_assert!(status.is_terminal());
        self.status = status;
        self.finished_at_ms = Some(clock.epoch_ms());
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether `now_ms` is past this job's deadline.
    pub fn is_past_deadline(&self, now_ms: u64) -> bool {
        now_ms >= self.deadline_ms
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            source_code: String = "print('hi')",
            workspace_path: PathBuf = "/tmp/isolab-test",
        }
        set {
            status: JobStatus = JobStatus::Pending,
            session_id: SessionId = SessionId::new(),
            submitted_at_ms: u64 = 0,
            deadline_ms: u64 = 600_000,
            diagnostic_mode: bool = false,
        }
        option {
            previous_attempt_id: JobId = None,
            user_id: String = None,
            started_at_ms: u64 = None,
            finished_at_ms: u64 = None,
        }
        computed {
            id: JobId = JobId::new(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
