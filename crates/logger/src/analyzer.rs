// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregate pattern analysis over recent failures: per-category counts and
//! fix rates, the most common specific error messages, and a short
//! AI-learning context string for the chat gateway (out of scope here).

use crate::error::LoggerError;
use crate::store::LogStore;
use isolab_core::{FailureCategory, LogEntryKind};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: FailureCategory,
    pub failures: usize,
    pub fixed: usize,
}

impl CategoryStats {
    pub fn fix_rate(&self) -> f64 {
        if self.failures == 0 {
            0.0
        } else {
            self.fixed as f64 / self.failures as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub category_stats: Vec<CategoryStats>,
    pub top_messages: Vec<(String, usize)>,
    pub context: String,
}

const CATEGORIES: &[FailureCategory] = &[
    FailureCategory::ImportError,
    FailureCategory::AttributeError,
    FailureCategory::DataAccessError,
    FailureCategory::TypeError,
    FailureCategory::ValueError,
    FailureCategory::Timeout,
    FailureCategory::RuntimeError,
    FailureCategory::Other,
];

/// Analyze the most recent `lookback` failures, summarizing the top `top_n`
/// unresolved patterns into `context`.
pub fn analyze(store: &LogStore, lookback: usize, top_n: usize) -> Result<Analysis, LoggerError> {
    let failures = store.recent(LogEntryKind::Failure, lookback, false)?;

    let mut per_category: HashMap<FailureCategory, CategoryStats> = HashMap::new();
    for category in CATEGORIES {
        per_category.insert(*category, CategoryStats { category: *category, failures: 0, fixed: 0 });
    }
    let mut message_counts: HashMap<String, usize> = HashMap::new();
    let mut unresolved_message_counts: HashMap<String, usize> = HashMap::new();

    for entry in &failures {
        let category = entry.category.unwrap_or(FailureCategory::Other);
        let stats = per_category.entry(category).or_insert(CategoryStats { category, failures: 0, fixed: 0 });
        stats.failures += 1;
        if entry.fixed_by.is_some() {
            stats.fixed += 1;
        }
        if let Some(message) = &entry.error_message {
            *message_counts.entry(message.clone()).or_insert(0) += 1;
            if entry.fixed_by.is_none() {
                *unresolved_message_counts.entry(message.clone()).or_insert(0) += 1;
            }
        }
    }

    let mut category_stats: Vec<CategoryStats> = per_category.into_values().collect();
    category_stats.sort_unstable_by(|a, b| b.failures.cmp(&a.failures).then(format!("{}", a.category).cmp(&format!("{}", b.category))));

    let mut top_messages: Vec<(String, usize)> = message_counts.into_iter().collect();
    top_messages.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    top_messages.truncate(top_n);

    let mut top_unresolved: Vec<(String, usize)> = unresolved_message_counts.into_iter().collect();
    top_unresolved.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    top_unresolved.truncate(top_n);

    let context = build_context(&top_unresolved);

    Ok(Analysis { category_stats, top_messages, context })
}

fn build_context(top_unresolved: &[(String, usize)]) -> String {
    if top_unresolved.is_empty() {
        return "No unresolved failure patterns in the recent lookback window.".to_string();
    }
    let lines: Vec<String> = top_unresolved
        .iter()
        .map(|(message, count)| format!("- ({count}x unresolved) {message}"))
        .collect();
    format!("Top unresolved failure patterns:\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewAttempt;
    use isolab_core::{JobId, Outcome, SessionId};
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
    fn counts_failures_per_category_and_fix_rate() {
        let dir = tempdir().expect("tempdir");
        let store = LogStore::new(dir.path());
        let session = SessionId::new();

        store.log_attempt(attempt(session, Outcome::Failure, 1_000, Some("KeyError: 'x'"))).expect("a");
        store.log_attempt(attempt(SessionId::new(), Outcome::Failure, 2_000, Some("KeyError: 'y'"))).expect("b");
        store.log_attempt(attempt(session, Outcome::Success, 3_000, None)).expect("fix");

        let analysis = analyze(&store, 100, 5).expect("analyze");
        let data_access = analysis
            .category_stats
            .iter()
            .find(|s| s.category == FailureCategory::DataAccessError)
            .expect("category present");
        assert_eq!(data_access.failures, 2);
        assert_eq!(data_access.fixed, 1);
        assert!((data_access.fix_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn context_string_is_empty_message_when_nothing_unresolved() {
        let dir = tempdir().expect("tempdir");
        let store = LogStore::new(dir.path());
        let analysis = analyze(&store, 100, 5).expect("analyze");
        assert!(analysis.context.contains("No unresolved"));
    }
}
