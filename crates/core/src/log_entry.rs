// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted execution record shape, shared between the logger (which
//! writes it) and the admission layer (which reads it back for responses
//! and analysis).

use crate::job::JobId;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a persisted log record.
    pub struct LogId("log-");
}

/// The sentinel prefix diagnostic instrumentation writes on every line it
/// injects. Shared here so the logger can tag sessions that ran under
/// diagnostic mode without depending on the `diagnostics` crate.
pub const DIAGNOSTIC_SENTINEL: &str = "[AUTO-DEBUG]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

crate::simple_display! {
    Outcome {
        Success => "success",
        Failure => "failure",
    }
}

/// Which on-disk partition (`failures/` or `successes/`) a record belongs
/// in. Derived from `Outcome`, kept distinct because it is a storage
/// concept, not a domain one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEntryKind {
    Failure,
    Success,
}

impl From<Outcome> for LogEntryKind {
    fn from(o: Outcome) -> Self {
        match o {
            Outcome::Success => LogEntryKind::Success,
            Outcome::Failure => LogEntryKind::Failure,
        }
    }
}

impl LogEntryKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            LogEntryKind::Failure => "failures",
            LogEntryKind::Success => "successes",
        }
    }
}

/// Failure category, derived from stderr substring matching by the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    ImportError,
    AttributeError,
    DataAccessError,
    TypeError,
    ValueError,
    Timeout,
    RuntimeError,
    Other,
}

crate::simple_display! {
    FailureCategory {
        ImportError => "import_error",
        AttributeError => "attribute_error",
        DataAccessError => "data_access_error",
        TypeError => "type_error",
        ValueError => "value_error",
        Timeout => "timeout",
        RuntimeError => "runtime_error",
        Other => "other",
    }
}

impl FailureCategory {
    /// Substring matching against stderr, in the priority order specified
    /// by the failure taxonomy. `exit_was_timeout` short-circuits to
    /// `Timeout` (exit code 124, or the job manager's own timeout signal,
    /// rather than anything the guest printed).
    pub fn derive(stderr: &str, exit_was_timeout: bool) -> Self {
        if exit_was_timeout {
            return FailureCategory::Timeout;
        }
        const RULES: &[(&[&str], FailureCategory)] = &[
            (&["ModuleNotFoundError", "ImportError"], FailureCategory::ImportError),
            (&["AttributeError"], FailureCategory::AttributeError),
            (&["KeyError", "IndexError"], FailureCategory::DataAccessError),
            (&["TypeError"], FailureCategory::TypeError),
            (&["ValueError"], FailureCategory::ValueError),
        ];
        for (needles, category) in RULES {
            if needles.iter().any(|needle| stderr.contains(needle)) {
                return *category;
            }
        }
        FailureCategory::RuntimeError
    }
}

/// A durable record of one job's terminal outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub log_id: LogId,
    pub job_id: JobId,
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_attempt_id: Option<JobId>,
    pub timestamp_ms: u64,
    pub outcome: Outcome,
    pub code_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<FailureCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// The successful log entry that resolved this failure, if any. This is
    /// the one field that may be set *after* the record was first written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_by: Option<LogId>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub diagnostic_mode: bool,
}

impl LogEntry {
    pub fn kind(&self) -> LogEntryKind {
        self.outcome.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_error_takes_priority_over_runtime_error() {
        let stderr = "Traceback...\nModuleNotFoundError: No module named 'scipy'\n";
        assert_eq!(
            FailureCategory::derive(stderr, false),
            FailureCategory::ImportError
        );
    }

    #[test]
    fn key_error_maps_to_data_access_error() {
        assert_eq!(
            FailureCategory::derive("KeyError: 'channel_2'", false),
            FailureCategory::DataAccessError
        );
    }

    #[test]
    fn unrecognized_error_falls_back_to_runtime_error() {
        assert_eq!(
            FailureCategory::derive("ZeroDivisionError: division by zero", false),
            FailureCategory::RuntimeError
        );
    }

    #[test]
    fn timeout_flag_overrides_stderr_content() {
        assert_eq!(
            FailureCategory::derive("TypeError: bad arg", true),
            FailureCategory::Timeout
        );
    }

    #[test]
    fn success_maps_to_successes_partition() {
        assert_eq!(LogEntryKind::from(Outcome::Success).dir_name(), "successes");
        assert_eq!(LogEntryKind::from(Outcome::Failure).dir_name(), "failures");
    }
}
