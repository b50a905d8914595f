// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The harvested result of one job execution.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Coarse classification of a harvested output file, derived from its
/// extension by the job manager (via `mime_guess`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Image,
    File,
}

crate::simple_display! {
    OutputKind {
        Image => "image",
        File => "file",
    }
}

/// One file found under a job's `output/` directory after the guest exits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFile {
    /// Path relative to `output/`.
    pub name: String,
    pub kind: OutputKind,
    pub size_bytes: u64,
}

/// What came back from running a guest program to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub output_files: Vec<OutputFile>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Set when the guest emitted an explicit `report_failure` marker,
    /// regardless of exit code.
    pub reported_failure: Option<String>,
}

impl RunResult {
    /// Success requires a zero exit code *and* no `report_failure` marker.
    pub fn succeeded(&self) -> bool {
        self.return_code == 0 && self.reported_failure.is_none()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}
