// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-delimited markers the guest emits on stdout as a back-channel to
//! the engine: logging, progress, failure reporting, and structured
//! output-creation commands.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const SENTINEL: &str = "@@ISOLAB-MARKER@@";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkerError {
    #[error("line is not a marker")]
    NotAMarker,
    #[error("malformed marker payload: {0}")]
    MalformedPayload(String),
    #[error("unknown marker name: {0}")]
    UnknownName(String),
}

/// Marker names recognized on the guest's stdout. `_async` variants are
/// always fire-and-forget; all others are confirmation-capable when their
/// payload sets `"await_confirmation": true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerName {
    LogInfo,
    LogWarning,
    LogError,
    ReportProgress,
    ReportFailure,
    CreateTileSet,
    CreateChannel,
    SendSingleTileOutput,
    CreateImageLayer,
    CreateAnnotation,
    StoreFile,
    AppendNotes,
    GetOrCreateOutputTileSet,
    CreateTileSetAsync,
    CreateChannelAsync,
    SendSingleTileOutputAsync,
    CreateImageLayerAsync,
    CreateAnnotationAsync,
    StoreFileAsync,
    AppendNotesAsync,
}

impl MarkerName {
    /// `_async`-suffixed markers never wait for a confirmation reply.
    pub fn is_always_async(self) -> bool {
        matches!(
            self,
            MarkerName::CreateTileSetAsync
                | MarkerName::CreateChannelAsync
                | MarkerName::SendSingleTileOutputAsync
                | MarkerName::CreateImageLayerAsync
                | MarkerName::CreateAnnotationAsync
                | MarkerName::StoreFileAsync
                | MarkerName::AppendNotesAsync
        )
    }

    /// Markers that never request confirmation and never carry structured
    /// arguments beyond plain text/number payloads.
    pub fn is_diagnostic_only(self) -> bool {
        matches!(
            self,
            MarkerName::LogInfo
                | MarkerName::LogWarning
                | MarkerName::LogError
                | MarkerName::ReportProgress
                | MarkerName::ReportFailure
        )
    }
}

/// One parsed marker line: `@@ISOLAB-MARKER@@ <name> <json-args>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub name: MarkerName,
    pub args: Value,
}

impl Marker {
    /// Parse a single stdout line. Lines without the sentinel prefix are
    /// ordinary guest output, not an error — callers should pass those
    /// straight through to captured stdout.
    pub fn parse(line: &str) -> Result<Marker, MarkerError> {
        let rest = line.strip_prefix(SENTINEL).ok_or(MarkerError::NotAMarker)?;
        let rest = rest.trim_start();
        let (name_str, args_str) = rest.split_once(' ').unwrap_or((rest, "{}"));
        let name: MarkerName = serde_json::from_value(Value::String(name_str.to_string()))
            .map_err(|_| MarkerError::UnknownName(name_str.to_string()))?;
        let args: Value = serde_json::from_str(args_str.trim())
            .map_err(|e| MarkerError::MalformedPayload(e.to_string()))?;
        Ok(Marker { name, args })
    }

    /// Whether this marker expects a synchronous confirmation reply on the
    /// guest's stdin: never for `_async` names, otherwise only when the
    /// payload explicitly opts in.
    pub fn awaits_confirmation(&self) -> bool {
        if self.name.is_always_async() || self.name.is_diagnostic_only() {
            return false;
        }
        self.args
            .get("await_confirmation")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_info_marker() {
        let marker = Marker::parse(r#"@@ISOLAB-MARKER@@ log_info {"message": "starting"}"#).unwrap();
        assert_eq!(marker.name, MarkerName::LogInfo);
        assert_eq!(marker.args["message"], "starting");
    }

    #[test]
    fn non_marker_line_is_not_an_error_category() {
        assert_eq!(Marker::parse("just some output"), Err(MarkerError::NotAMarker));
    }

    #[test]
    fn unknown_marker_name_is_rejected() {
        let err = Marker::parse(r#"@@ISOLAB-MARKER@@ nonexistent_marker {}"#).unwrap_err();
        assert_eq!(err, MarkerError::UnknownName("nonexistent_marker".to_string()));
    }

    #[test]
    fn async_suffixed_marker_never_awaits_confirmation() {
        let marker =
            Marker::parse(r#"@@ISOLAB-MARKER@@ create_tile_set_async {"await_confirmation": true}"#)
                .unwrap();
        assert!(!marker.awaits_confirmation());
    }

    #[test]
    fn sync_marker_awaits_confirmation_only_when_requested() {
        let implicit =
            Marker::parse(r#"@@ISOLAB-MARKER@@ create_tile_set {"name": "ts"}"#).unwrap();
        assert!(!implicit.awaits_confirmation());

        let explicit = Marker::parse(
            r#"@@ISOLAB-MARKER@@ create_tile_set {"name": "ts", "await_confirmation": true}"#,
        )
        .unwrap();
        assert!(explicit.awaits_confirmation());
    }

    #[test]
    fn diagnostic_markers_never_await_confirmation_even_if_requested() {
        let marker = Marker::parse(
            r#"@@ISOLAB-MARKER@@ report_progress {"percent": 50.0, "await_confirmation": true}"#,
        )
        .unwrap();
        assert!(!marker.awaits_confirmation());
    }

    #[test]
    fn malformed_json_payload_is_rejected() {
        let err = Marker::parse(r#"@@ISOLAB-MARKER@@ log_info {not json}"#).unwrap_err();
        assert!(matches!(err, MarkerError::MalformedPayload(_)));
    }
}
