// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers exposed to other crates via the `test-support`
//! feature, so downstream crates build real [`Job`]/[`Session`] values
//! instead of hand-rolling fixtures that drift from the real constructors.

use crate::clock::FakeClock;
use crate::job::{Job, JobId};
use crate::session::{Session, SessionId};
use std::path::PathBuf;

/// A job + session pair with a deterministic clock, for crates that need a
/// realistic starting point without re-deriving the construction sequence.
pub fn fresh_job(workspace_root: impl Into<PathBuf>) -> (Job, Session, FakeClock) {
    let clock = FakeClock::new();
    let session_id = SessionId::new();
    let job = Job::new(
        session_id.clone(),
        "print('hello')".to_string(),
        workspace_root.into(),
        600,
        &clock,
    );
    let session = Session::new(session_id, clock.epoch_ms());
    (job, session, clock)
}

/// A job that is a retry of `previous`, sharing its session.
pub fn retry_of(previous: &Job, source_code: impl Into<String>, clock: &FakeClock) -> Job {
    let mut job = Job::new(
        previous.session_id.clone(),
        source_code.into(),
        previous.workspace_path.clone(),
        600,
        clock,
    );
    job.previous_attempt_id = Some(previous.id);
    job
}

#[allow(dead_code)]
fn assert_send_sync<T: Send + Sync>() {}

#[allow(dead_code)]
const _: fn() = || {
    assert_send_sync::<JobId>();
};
