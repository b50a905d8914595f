// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace layout: the three subtrees a job's guest program sees.
//!
//! A workspace is a managed directory with `code/`, `input/`, and `output/`
//! subtrees. `code/` and `input/` are read-only to the guest; `output/` is
//! the only directory the guest may write into. This module only describes
//! the layout and validates paths; actual directory creation belongs to the
//! crate that owns the filesystem (the job manager).

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("relative path escapes the workspace: {0}")]
    PathEscape(String),
    #[error("path is not relative: {0}")]
    NotRelative(String),
}

/// A materialized job workspace rooted at `root`.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn code_dir(&self) -> PathBuf {
        self.root.join("code")
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root.join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn code_file(&self) -> PathBuf {
        self.code_dir().join("main.py")
    }

    /// Resolve a caller-supplied relative path against `output/`, rejecting
    /// anything that could escape the workspace (`..`, absolute paths,
    /// embedded root components). Used by the admission layer when serving
    /// harvested artifacts.
    pub fn resolve_output_path(&self, relpath: &str) -> Result<PathBuf, WorkspaceError> {
        let candidate = Path::new(relpath);
        if candidate.is_absolute() {
            return Err(WorkspaceError::NotRelative(relpath.to_string()));
        }
        for component in candidate.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(WorkspaceError::PathEscape(relpath.to_string())),
            }
        }
        Ok(self.output_dir().join(candidate))
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
