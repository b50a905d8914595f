// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic write helper: serialize to a temp file beside the destination,
//! `fsync`, then `rename` over the final path. Matches the teacher's
//! snapshot-rotation convention (write-then-rename, never a partial file
//! visible at the final path).

use std::fs;
use std::io;
use std::path::Path;

/// Write `bytes` to `path` atomically. Creates parent directories as
/// needed. On any failure the destination is left untouched: either the
/// temp file write/fsync failed (nothing renamed), or the rename itself
/// failed (original, if any, is still there).
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension(tmp_extension(path));
    let file = fs::File::create(&tmp_path)?;
    {
        use std::io::Write;
        let mut file = &file;
        file.write_all(bytes)?;
    }
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_extension(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{ext}.tmp"),
        None => "tmp".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_the_file_and_leaves_no_temp_behind() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("record.json");
        write_atomic(&path, b"{\"a\":1}").expect("write");
        assert_eq!(fs::read(&path).expect("read"), b"{\"a\":1}");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn overwrites_an_existing_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("record.json");
        write_atomic(&path, b"first").expect("write");
        write_atomic(&path, b"second").expect("write");
        assert_eq!(fs::read(&path).expect("read"), b"second");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("failures/2026-07-26/log-abc.json");
        write_atomic(&path, b"{}").expect("write");
        assert!(path.exists());
    }
}
