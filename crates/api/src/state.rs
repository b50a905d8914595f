// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide state shared across every handler: the Job Manager, the
//! log store, and the bits of config the routes need directly. Constructed
//! once at startup and handed to the router as `axum::extract::State`.

use isolab_core::{JobId, Workspace};
use isolab_engine::JobManager;
use isolab_logger::LogStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobManager>,
    pub logger: Arc<LogStore>,
    pub output_retention: Duration,
    pub started_at: Instant,
    /// Human-readable runtime backend name for `GET /version`.
    pub runtime_label: String,
}

impl AppState {
    /// Where a job's harvested artifacts live. Stable for the job's whole
    /// lifetime, so this resolves the same path whether the job is still
    /// running or finished long ago.
    pub fn output_workspace(&self, job_id: &JobId) -> Workspace {
        Workspace::new(self.jobs.workspace_path_for(job_id))
    }
}
