// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What the admission layer hands the Job Manager for one `submit` call.

use isolab_core::SessionId;

/// One job submission, already validated by the admission layer (size
/// budgets, required fields) before it reaches `JobManager::submit`.
#[derive(Debug, Clone)]
pub struct Submission {
    pub source_code: String,
    /// Raw image bytes, present iff the caller uploaded one directly.
    pub image_bytes: Option<Vec<u8>>,
    /// A name to resolve against the image library, tried only when
    /// `image_bytes` is absent.
    pub image_ref: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<SessionId>,
    pub previous_attempt_id: Option<isolab_core::JobId>,
    pub user_prompt: Option<String>,
    pub ai_model: Option<String>,
    pub inject_debug: bool,
    /// Verbatim JSON passed through to the guest as `RunRequest::script_parameters`.
    /// Defaults to `"{}"` when the caller supplies none.
    pub script_parameters: Option<String>,
}
