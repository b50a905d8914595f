// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `LogStore`: durable audit and learning store for job outcomes.
//!
//! Every terminal outcome is appended to a date-partitioned JSON tree and
//! folded into its session's attempt chain. Writes are atomic; a per-session
//! lock keeps the session file's read-modify-write cycle race-free.

use crate::atomic::write_atomic;
use crate::error::LoggerError;
use crate::partition::date_partition;
use crate::session_file::{AttemptRecord, SessionFile};
use isolab_core::{FailureCategory, JobId, LogEntry, LogEntryKind, LogId, Outcome, SessionId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Everything needed to record one job's terminal outcome; `LogStore`
/// assigns the `log_id` and derives category/tags itself.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub job_id: JobId,
    pub session_id: SessionId,
    pub previous_attempt_id: Option<JobId>,
    pub timestamp_ms: u64,
    pub outcome: Outcome,
    pub code_hash: String,
    pub user_prompt: Option<String>,
    pub ai_model: Option<String>,
    pub stderr: Option<String>,
    pub exit_was_timeout: bool,
    pub diagnostic_mode: bool,
}

pub struct LogStore {
    root: PathBuf,
    session_locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
    errors_total: AtomicU64,
}

impl LogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), session_locks: Mutex::new(HashMap::new()), errors_total: AtomicU64::new(0) }
    }

    pub fn errors_total(&self) -> u64 {
        self.errors_total.load(Ordering::Relaxed)
    }

    fn session_lock(&self, session_id: &SessionId) -> Arc<Mutex<()>> {
        self.session_locks
            .lock()
            .entry(*session_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn log_path(&self, kind: LogEntryKind, date: &str, log_id: &LogId) -> PathBuf {
        self.root.join(kind.dir_name()).join(date).join(format!("{log_id}.json"))
    }

    fn session_path(&self, session_id: &SessionId) -> PathBuf {
        self.root.join("sessions").join(format!("{session_id}.json"))
    }

    fn load_session(&self, session_id: &SessionId, created_at_ms: u64) -> Result<SessionFile, LoggerError> {
        let path = self.session_path(session_id);
        match fs::read(&path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionFile::new(*session_id, created_at_ms)),
            Err(e) => Err(e.into()),
        }
    }

    fn record_failure_persist_error(&self, error: &LoggerError) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
        tracing::error!(error = %error, "logger failed to persist a record");
    }

    /// Record one terminal outcome: write the date-partitioned log record,
    /// fold it into the session file. Returns the assigned `LogEntry`.
    ///
    /// On a persistence failure the error is logged and the internal
    /// counter bumped, then returned to the caller — callers that must
    /// not abort a job on a logger failure (the job manager) are expected
    /// to swallow it after surfacing a warning, not this function.
    pub fn log_attempt(&self, attempt: NewAttempt) -> Result<LogEntry, LoggerError> {
        let result = self.log_attempt_inner(attempt);
        if let Err(ref e) = result {
            self.record_failure_persist_error(e);
        }
        result
    }

    fn log_attempt_inner(&self, attempt: NewAttempt) -> Result<LogEntry, LoggerError> {
        let log_id = LogId::new();
        let category = match attempt.outcome {
            Outcome::Failure => {
                Some(FailureCategory::derive(attempt.stderr.as_deref().unwrap_or(""), attempt.exit_was_timeout))
            }
            Outcome::Success => None,
        };
        let error_message = match attempt.outcome {
            Outcome::Failure => attempt.stderr.as_deref().and_then(first_error_line),
            Outcome::Success => None,
        };
        let tags = derive_tags(category, attempt.stderr.as_deref());

        let entry = LogEntry {
            log_id,
            job_id: attempt.job_id,
            session_id: attempt.session_id,
            previous_attempt_id: attempt.previous_attempt_id,
            timestamp_ms: attempt.timestamp_ms,
            outcome: attempt.outcome,
            code_hash: attempt.code_hash,
            user_prompt: attempt.user_prompt,
            ai_model: attempt.ai_model,
            category,
            error_message,
            stderr: attempt.stderr,
            fixed_by: None,
            tags,
            diagnostic_mode: attempt.diagnostic_mode,
        };

        let date = date_partition(entry.timestamp_ms);
        let path = self.log_path(entry.kind(), &date, &entry.log_id);
        write_atomic(&path, serde_json::to_string_pretty(&entry)?.as_bytes())?;

        let lock = self.session_lock(&entry.session_id);
        let _guard = lock.lock();
        let mut session = self.load_session(&entry.session_id, entry.timestamp_ms)?;
        session.record_attempt(AttemptRecord {
            job_id: entry.job_id,
            log_id: entry.log_id,
            outcome: entry.outcome,
            timestamp_ms: entry.timestamp_ms,
            fixed_by: None,
        });
        if session.is_resolved() && entry.outcome == Outcome::Success {
            self.backfill_fixed_by(&session)?;
        }
        write_atomic(&self.session_path(&entry.session_id), serde_json::to_string_pretty(&session)?.as_bytes())?;

        Ok(entry)
    }

    /// Stamp `fixed_by` onto every prior unresolved failure record on disk,
    /// matching the session file's in-memory back-fill.
    fn backfill_fixed_by(&self, session: &SessionFile) -> Result<(), LoggerError> {
        for attempt in &session.attempts {
            if attempt.outcome != Outcome::Failure || attempt.fixed_by.is_none() {
                continue;
            }
            let date = date_partition(attempt.timestamp_ms);
            let path = self.log_path(LogEntryKind::Failure, &date, &attempt.log_id);
            if let Ok(bytes) = fs::read(&path) {
                if let Ok(mut entry) = serde_json::from_slice::<LogEntry>(&bytes) {
                    entry.fixed_by = attempt.fixed_by;
                    write_atomic(&path, serde_json::to_string_pretty(&entry)?.as_bytes())?;
                }
            }
        }
        Ok(())
    }

    pub fn get_log(&self, log_id: &LogId) -> Result<LogEntry, LoggerError> {
        for kind in [LogEntryKind::Failure, LogEntryKind::Success] {
            for date in list_partitions(&self.root.join(kind.dir_name())) {
                let path = self.log_path(kind, &date, log_id);
                if let Ok(bytes) = fs::read(&path) {
                    return Ok(serde_json::from_slice(&bytes)?);
                }
            }
        }
        Err(LoggerError::LogNotFound(log_id.to_string()))
    }

    pub fn get_session(&self, session_id: &SessionId) -> Result<SessionFile, LoggerError> {
        let path = self.session_path(session_id);
        let bytes = fs::read(&path).map_err(|_| LoggerError::SessionNotFound(session_id.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Most recent records of a kind, newest partition first, newest within
    /// a partition first, up to `limit`.
    pub fn recent(&self, kind: LogEntryKind, limit: usize, unfixed_only: bool) -> Result<Vec<LogEntry>, LoggerError> {
        let mut out = Vec::new();
        let dir = self.root.join(kind.dir_name());
        let mut partitions = list_partitions(&dir);
        partitions.sort_unstable_by(|a, b| b.cmp(a));
        for date in partitions {
            let mut entries = read_partition(&dir.join(&date))?;
            entries.sort_unstable_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
            for entry in entries {
                if unfixed_only && entry.fixed_by.is_some() {
                    continue;
                }
                out.push(entry);
                if out.len() >= limit {
                    return Ok(out);
                }
            }
        }
        Ok(out)
    }

    /// Delete every date partition strictly before `keep_from` (a
    /// `YYYY-MM-DD` string; partition names sort lexically by date).
    /// Returns the number of partitions removed.
    pub fn clear_logs(&self, keep_from: &str) -> Result<usize, LoggerError> {
        let mut removed = 0;
        for kind in [LogEntryKind::Failure, LogEntryKind::Success] {
            let dir = self.root.join(kind.dir_name());
            for date in list_partitions(&dir) {
                if date.as_str() < keep_from {
                    fs::remove_dir_all(dir.join(&date))?;
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

fn list_partitions(dir: &Path) -> Vec<String> {
    let Ok(read_dir) = fs::read_dir(dir) else { return Vec::new() };
    read_dir
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect()
}

fn read_partition(dir: &Path) -> Result<Vec<LogEntry>, LoggerError> {
    let Ok(read_dir) = fs::read_dir(dir) else { return Ok(Vec::new()) };
    let mut entries = Vec::new();
    for item in read_dir.filter_map(|e| e.ok()) {
        if item.path().extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let bytes = fs::read(item.path())?;
        entries.push(serde_json::from_slice(&bytes)?);
    }
    Ok(entries)
}

/// First non-blank line of a traceback, used as the short `error_message`.
fn first_error_line(stderr: &str) -> Option<String> {
    stderr.lines().rev().find(|line| !line.trim().is_empty()).map(str::to_string)
}

/// `lib:<name>` tags for every `No module named '<name>'` mention, plus a
/// `category:<name>` tag when a category was derived.
fn derive_tags(category: Option<FailureCategory>, stderr: Option<&str>) -> Vec<String> {
    let mut tags = Vec::new();
    if let Some(category) = category {
        tags.push(format!("category:{category}"));
    }
    if let Some(stderr) = stderr {
        const NEEDLE: &str = "No module named '";
        let mut rest = stderr;
        while let Some(pos) = rest.find(NEEDLE) {
            let after = &rest[pos + NEEDLE.len()..];
            if let Some(end) = after.find('\'') {
                tags.push(format!("lib:{}", &after[..end]));
                rest = &after[end..];
            } else {
                break;
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn attempt(session_id: SessionId, outcome: Outcome, ts: u64, stderr: Option<&str>) -> NewAttempt {
        NewAttempt {
            job_id: JobId::new(),
            session_id,
            previous_attempt_id: None,
            timestamp_ms: ts,
            outcome,
            code_hash: "deadbeef".to_string(),
            user_prompt: None,
            ai_model: None,
            stderr: stderr.map(str::to_string),
            exit_was_timeout: false,
            diagnostic_mode: false,
        }
    }

    #[test]
    fn log_attempt_writes_a_readable_record_and_updates_the_session() {
        let dir = tempdir().expect("tempdir");
        let store = LogStore::new(dir.path());
        let session_id = SessionId::new();

        let entry = store
            .log_attempt(attempt(session_id, Outcome::Failure, 1_785_024_000_000, Some("ValueError: bad")))
            .expect("log");
        assert_eq!(entry.category, Some(FailureCategory::ValueError));

        let fetched = store.get_log(&entry.log_id).expect("get_log");
        assert_eq!(fetched.log_id, entry.log_id);

        let session = store.get_session(&session_id).expect("get_session");
        assert_eq!(session.attempts.len(), 1);
        assert!(!session.is_resolved());
    }

    #[test]
    fn a_success_backfills_fixed_by_on_prior_failures() {
        let dir = tempdir().expect("tempdir");
        let store = LogStore::new(dir.path());
        let session_id = SessionId::new();

        let failure = store
            .log_attempt(attempt(session_id, Outcome::Failure, 1_785_024_000_000, Some("TypeError: x")))
            .expect("log failure");
        store
            .log_attempt(attempt(session_id, Outcome::Success, 1_785_024_100_000, None))
            .expect("log success");

        let refreshed = store.get_log(&failure.log_id).expect("get_log");
        assert!(refreshed.fixed_by.is_some());
    }

    #[test]
    fn recent_failures_can_filter_to_unfixed_only() {
        let dir = tempdir().expect("tempdir");
        let store = LogStore::new(dir.path());
        let session_a = SessionId::new();
        let session_b = SessionId::new();

        store.log_attempt(attempt(session_a, Outcome::Failure, 1_785_024_000_000, Some("KeyError: 'x'"))).expect("a");
        store.log_attempt(attempt(session_b, Outcome::Failure, 1_785_024_010_000, Some("KeyError: 'y'"))).expect("b");
        store.log_attempt(attempt(session_a, Outcome::Success, 1_785_024_020_000, None)).expect("fix a");

        let all = store.recent(LogEntryKind::Failure, 10, false).expect("recent");
        assert_eq!(all.len(), 2);

        let unfixed = store.recent(LogEntryKind::Failure, 10, true).expect("recent unfixed");
        assert_eq!(unfixed.len(), 1);
    }

    #[test]
    fn derive_tags_extracts_module_mentions() {
        let tags = derive_tags(
            Some(FailureCategory::ImportError),
            Some("ModuleNotFoundError: No module named 'scipy'"),
        );
        assert!(tags.contains(&"category:import_error".to_string()));
        assert!(tags.contains(&"lib:scipy".to_string()));
    }

    #[test]
    fn clear_logs_removes_only_partitions_before_the_cutoff() {
        let dir = tempdir().expect("tempdir");
        let store = LogStore::new(dir.path());
        store.log_attempt(attempt(SessionId::new(), Outcome::Failure, 1_735_084_800_000, Some("x"))).expect("old");
        store.log_attempt(attempt(SessionId::new(), Outcome::Failure, 1_785_024_000_000, Some("x"))).expect("new");

        let removed = store.clear_logs("2026-01-01").expect("clear");
        assert_eq!(removed, 1);
        assert_eq!(store.recent(LogEntryKind::Failure, 10, false).expect("recent").len(), 1);
    }
}
