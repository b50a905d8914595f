// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier and the attempt chain it groups.
//!
//! A session links related job attempts (a failure, a retry, a fix) so the
//! execution logger can compute fix rates and point each failure at the
//! attempt that eventually resolved it.

use crate::job::JobId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a session (a chain of related job attempts).
    pub struct SessionId("ses-");
}

/// A chain of attempts sharing a `session_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub created_at_ms: u64,
    /// Set once any attempt in the session succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at_ms: Option<u64>,
    /// Attempt log ids, in submission order.
    #[serde(default)]
    pub attempts: Vec<JobId>,
}

impl Session {
    pub fn new(id: SessionId, created_at_ms: u64) -> Self {
        Self {
            id,
            created_at_ms,
            resolved_at_ms: None,
            attempts: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at_ms.is_some()
    }

    /// Record an attempt; marks the session resolved if `succeeded` and it
    /// is not already resolved.
    pub fn record_attempt(&mut self, job_id: JobId, succeeded: bool, now_ms: u64) {
        self.attempts.push(job_id);
        if succeeded && self.resolved_at_ms.is_none() {
            self.resolved_at_ms = Some(now_ms);
        }
    }

    /// Count of consecutive failures immediately preceding `attempts.len()`
    /// attempts already recorded, i.e. how many attempts back-to-back failed
    /// before this session resolved. Used by diagnostic instrumentation's
    /// failure-threshold check; `fixed` flags one bool per recorded attempt
    /// in the same order as `attempts`.
    pub fn consecutive_failures(fixed: &[bool]) -> u32 {
        fixed.iter().rev().take_while(|&&ok| !ok).count() as u32
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
