// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Confirmation replies: what the engine writes back to the guest's stdin
//! when a marker requested one.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    pub is_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl Confirmation {
    pub fn ok() -> Self {
        Self { is_success: true, error_message: None, result: None }
    }

    pub fn ok_with(result: serde_json::Value) -> Self {
        Self { is_success: true, error_message: None, result: Some(result) }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { is_success: false, error_message: Some(message.into()), result: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_confirmation_serializes_without_error_message() {
        let json = serde_json::to_value(Confirmation::ok()).unwrap();
        assert_eq!(json, serde_json::json!({"is_success": true}));
    }

    #[test]
    fn error_confirmation_carries_message() {
        let c = Confirmation::error("tile not found");
        assert!(!c.is_success);
        assert_eq!(c.error_message.as_deref(), Some("tile not found"));
    }
}
