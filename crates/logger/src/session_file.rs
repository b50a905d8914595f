// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk session record: every attempt in a session, in order, with
//! enough detail (outcome, log id, fix back-pointer) for the analyzer and
//! the admission layer's `get_session` to answer without re-reading every
//! individual log entry.

use isolab_core::{JobId, LogId, Outcome, SessionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub job_id: JobId,
    pub log_id: LogId,
    pub outcome: Outcome,
    pub timestamp_ms: u64,
    /// Set once a later attempt in the same session succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_by: Option<LogId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub id: SessionId,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at_ms: Option<u64>,
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
}

impl SessionFile {
    pub fn new(id: SessionId, created_at_ms: u64) -> Self {
        Self { id, created_at_ms, resolved_at_ms: None, attempts: Vec::new() }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at_ms.is_some()
    }

    /// Append this attempt. If it succeeded, mark the session resolved (if
    /// not already) and back-fill `fixed_by` on every unresolved previous
    /// attempt.
    pub fn record_attempt(&mut self, attempt: AttemptRecord) {
        let succeeded = attempt.outcome == Outcome::Success;
        if succeeded {
            if self.resolved_at_ms.is_none() {
                self.resolved_at_ms = Some(attempt.timestamp_ms);
            }
            for previous in &mut self.attempts {
                if previous.outcome == Outcome::Failure && previous.fixed_by.is_none() {
                    previous.fixed_by = Some(attempt.log_id.clone());
                }
            }
        }
        self.attempts.push(attempt);
    }

    /// Consecutive failures immediately preceding the end of the attempt
    /// chain — what diagnostic instrumentation's failure-threshold check
    /// consults.
    pub fn consecutive_failures(&self) -> u32 {
        self.attempts
            .iter()
            .rev()
            .take_while(|attempt| attempt.outcome == Outcome::Failure)
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(outcome: Outcome, ts: u64) -> AttemptRecord {
        AttemptRecord { job_id: JobId::new(), log_id: LogId::new(), outcome, timestamp_ms: ts, fixed_by: None }
    }

    #[test]
    fn success_resolves_and_backfills_previous_failures() {
        let mut session = SessionFile::new(SessionId::new(), 1_000);
        session.record_attempt(attempt(Outcome::Failure, 2_000));
        session.record_attempt(attempt(Outcome::Failure, 3_000));
        let fix_log_id = LogId::new();
        let mut fix = attempt(Outcome::Success, 4_000);
        fix.log_id = fix_log_id.clone();
        session.record_attempt(fix);

        assert!(session.is_resolved());
        assert_eq!(session.attempts[0].fixed_by, Some(fix_log_id.clone()));
        assert_eq!(session.attempts[1].fixed_by, Some(fix_log_id));
        assert!(session.attempts[2].fixed_by.is_none());
    }

    #[test]
    fn consecutive_failures_resets_after_a_success() {
        let mut session = SessionFile::new(SessionId::new(), 1_000);
        session.record_attempt(attempt(Outcome::Failure, 2_000));
        session.record_attempt(attempt(Outcome::Success, 3_000));
        session.record_attempt(attempt(Outcome::Failure, 4_000));
        assert_eq!(session.consecutive_failures(), 1);
    }

    #[test]
    fn does_not_move_resolved_at_on_a_later_success() {
        let mut session = SessionFile::new(SessionId::new(), 1_000);
        session.record_attempt(attempt(Outcome::Success, 2_000));
        session.record_attempt(attempt(Outcome::Success, 3_000));
        assert_eq!(session.resolved_at_ms, Some(2_000));
    }
}
