// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shapes for the admission HTTP surface (§4.6, §6). Kept distinct
//! from the domain types in `isolab-core`/`isolab-logger` so a field rename
//! on the wire never forces a rename on the types those crates already
//! export for their own (non-serde-shaped) purposes.

use isolab_core::{FailureCategory, JobStatus, OutputKind, RunResult};
use isolab_engine::{DiagnosticMode, JobOutcome};
use isolab_logger::{Analysis, CategoryStats, SessionFile};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct OutputFileDto {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: OutputKind,
    pub size: u64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DiagnosticModeDto {
    Activated { message: String },
    Deactivated { message: String, cleaned_code: String },
}

impl From<DiagnosticMode> for DiagnosticModeDto {
    fn from(mode: DiagnosticMode) -> Self {
        match mode {
            DiagnosticMode::Activated { message } => DiagnosticModeDto::Activated { message },
            DiagnosticMode::Deactivated { message, cleaned_code } => {
                DiagnosticModeDto::Deactivated { message, cleaned_code }
            }
        }
    }
}

/// `POST /run` response body, success or guest/backend failure alike — the
/// shape differs only in which fields are populated, matching §4.6's two
/// response sketches.
#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub job_id: String,
    pub log_id: String,
    pub session_id: String,
    pub status: JobStatus,
    pub stdout: String,
    pub stderr: String,
    pub return_code: i32,
    pub output_files: Vec<OutputFileDto>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic_mode: Option<DiagnosticModeDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl RunResponse {
    /// `timeout_secs` is the configured per-script deadline, reported back
    /// only when this attempt actually hit it (§4.6, §8 scenario 3).
    pub fn from_outcome(outcome: JobOutcome, timeout_secs: u64, job_id_url: impl Fn(&str) -> String) -> Self {
        let result: RunResult = outcome.result;
        let output_files = result
            .output_files
            .into_iter()
            .map(|f| OutputFileDto {
                url: job_id_url(&f.name),
                name: f.name,
                kind: f.kind,
                size: f.size_bytes,
            })
            .collect();

        let error = match outcome.status {
            JobStatus::Failed => Some(result.reported_failure.clone().unwrap_or_else(|| "guest exited non-zero".to_string())),
            JobStatus::TimedOut => Some("deadline exceeded".to_string()),
            JobStatus::Cancelled => Some("cancelled".to_string()),
            _ => None,
        };

        let timeout = matches!(outcome.status, JobStatus::TimedOut).then_some(timeout_secs);

        Self {
            job_id: outcome.job_id.to_string(),
            log_id: outcome.log_id.to_string(),
            session_id: outcome.session_id.to_string(),
            status: outcome.status,
            stdout: result.stdout,
            stderr: result.stderr,
            return_code: result.return_code,
            output_files,
            duration_ms: result.duration.as_millis() as u64,
            diagnostic_mode: outcome.diagnostic_mode.map(DiagnosticModeDto::from),
            error,
            timeout,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub runtime: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub errors_total: u64,
}

#[derive(Debug, Serialize)]
pub struct AttemptRecordDto {
    pub job_id: String,
    pub log_id: String,
    pub outcome: isolab_core::Outcome,
    pub timestamp_ms: u64,
    pub fixed_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub created_at_ms: u64,
    pub resolved_at_ms: Option<u64>,
    pub attempts: Vec<AttemptRecordDto>,
}

impl From<SessionFile> for SessionResponse {
    fn from(session: SessionFile) -> Self {
        Self {
            session_id: session.id.to_string(),
            created_at_ms: session.created_at_ms,
            resolved_at_ms: session.resolved_at_ms,
            attempts: session
                .attempts
                .into_iter()
                .map(|a| AttemptRecordDto {
                    job_id: a.job_id.to_string(),
                    log_id: a.log_id.to_string(),
                    outcome: a.outcome,
                    timestamp_ms: a.timestamp_ms,
                    fixed_by: a.fixed_by.map(|id| id.to_string()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogEntryResponse {
    pub log_id: String,
    pub job_id: String,
    pub session_id: String,
    pub previous_attempt_id: Option<String>,
    pub timestamp_ms: u64,
    pub outcome: isolab_core::Outcome,
    pub code_hash: String,
    pub user_prompt: Option<String>,
    pub ai_model: Option<String>,
    pub category: Option<FailureCategory>,
    pub error_message: Option<String>,
    pub stderr: Option<String>,
    pub fixed_by: Option<String>,
    pub tags: Vec<String>,
    pub diagnostic_mode: bool,
}

impl From<isolab_core::LogEntry> for LogEntryResponse {
    fn from(entry: isolab_core::LogEntry) -> Self {
        Self {
            log_id: entry.log_id.to_string(),
            job_id: entry.job_id.to_string(),
            session_id: entry.session_id.to_string(),
            previous_attempt_id: entry.previous_attempt_id.map(|id| id.to_string()),
            timestamp_ms: entry.timestamp_ms,
            outcome: entry.outcome,
            code_hash: entry.code_hash,
            user_prompt: entry.user_prompt,
            ai_model: entry.ai_model,
            category: entry.category,
            error_message: entry.error_message,
            stderr: entry.stderr,
            fixed_by: entry.fixed_by.map(|id| id.to_string()),
            tags: entry.tags,
            diagnostic_mode: entry.diagnostic_mode,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryStatsDto {
    pub category: FailureCategory,
    pub failures: usize,
    pub fixed: usize,
    pub fix_rate: f64,
}

impl From<CategoryStats> for CategoryStatsDto {
    fn from(stats: CategoryStats) -> Self {
        let fix_rate = stats.fix_rate();
        Self { category: stats.category, failures: stats.failures, fixed: stats.fixed, fix_rate }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub category_stats: Vec<CategoryStatsDto>,
    pub top_messages: Vec<TopMessageDto>,
    pub context: String,
}

#[derive(Debug, Serialize)]
pub struct TopMessageDto {
    pub message: String,
    pub count: usize,
}

impl From<Analysis> for AnalysisResponse {
    fn from(analysis: Analysis) -> Self {
        Self {
            category_stats: analysis.category_stats.into_iter().map(CategoryStatsDto::from).collect(),
            top_messages: analysis
                .top_messages
                .into_iter()
                .map(|(message, count)| TopMessageDto { message, count })
                .collect(),
            context: analysis.context,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub failures_recent: usize,
    pub successes_recent: usize,
    pub errors_total: u64,
}

#[derive(Debug, Serialize)]
pub struct ClearLogsResponse {
    pub partitions_removed: usize,
}
