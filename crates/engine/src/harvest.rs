// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Enumerates a job's `output/` directory after the guest exits and
//! classifies each file by extension.

use isolab_core::{OutputFile, OutputKind};
use std::fs;
use std::path::Path;

/// Walk `output_dir` (non-recursively — the guest support module never
/// nests output paths) and classify each entry. Returns the empty list if
/// the guest wrote nothing, which is not itself a failure.
pub fn harvest(output_dir: &Path) -> std::io::Result<Vec<OutputFile>> {
    let Ok(read_dir) = fs::read_dir(output_dir) else {
        return Ok(Vec::new());
    };

    let mut files = Vec::new();
    for entry in read_dir.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let metadata = entry.metadata()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        files.push(OutputFile { name, kind: classify(&path), size_bytes: metadata.len() });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

fn classify(path: &Path) -> OutputKind {
    let guess = mime_guess::from_path(path).first_or_octet_stream();
    if guess.type_() == mime_guess::mime::IMAGE {
        OutputKind::Image
    } else {
        OutputKind::File
    }
}
