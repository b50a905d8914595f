// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Writes a job's `code/`, `input/`, `output/` subtrees to disk before the
//! runtime backend is asked to run it.

use isolab_core::Workspace;
use isolab_protocol::guest_module::{GUEST_SUPPORT_MODULE, GUEST_SUPPORT_MODULE_FILENAME};
use std::fs;
use std::path::Path;

/// Name the uploaded/library-resolved image is staged under in `input/`.
/// The guest locates it via the path recorded in the `RunRequest` it is
/// handed, not by guessing this constant itself.
pub const STAGED_IMAGE_FILENAME: &str = "input.bin";

/// Write `code/main.py`, the guest support module alongside it, stage
/// `image_bytes` into `input/` if present, and ensure `output/` exists.
pub fn materialize(
    workspace: &Workspace,
    source_code: &str,
    image_bytes: Option<&[u8]>,
) -> std::io::Result<()> {
    fs::create_dir_all(workspace.code_dir())?;
    fs::create_dir_all(workspace.input_dir())?;
    fs::create_dir_all(workspace.output_dir())?;

    fs::write(workspace.code_file(), source_code)?;
    fs::write(workspace.code_dir().join(GUEST_SUPPORT_MODULE_FILENAME), GUEST_SUPPORT_MODULE)?;

    if let Some(bytes) = image_bytes {
        fs::write(workspace.input_dir().join(STAGED_IMAGE_FILENAME), bytes)?;
    }

    Ok(())
}

/// Absolute in-container path the guest will see for the staged image,
/// relative to the container's mounted `/input`.
pub fn staged_image_container_path() -> String {
    format!("/input/{STAGED_IMAGE_FILENAME}")
}

/// Whether `path`'s workspace actually has a staged input image on disk.
pub fn has_staged_image(workspace: &Path) -> bool {
    workspace.join("input").join(STAGED_IMAGE_FILENAME).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn materialize_writes_code_support_module_and_creates_output() {
        let dir = tempdir().expect("tempdir");
        let workspace = Workspace::new(dir.path().to_path_buf());
        materialize(&workspace, "print('hi')", None).expect("materialize");

        assert!(workspace.code_file().is_file());
        assert!(workspace.code_dir().join(GUEST_SUPPORT_MODULE_FILENAME).is_file());
        assert!(workspace.output_dir().is_dir());
        assert!(!has_staged_image(workspace.root()));
    }

    #[test]
    fn materialize_stages_image_bytes_when_present() {
        let dir = tempdir().expect("tempdir");
        let workspace = Workspace::new(dir.path().to_path_buf());
        materialize(&workspace, "print('hi')", Some(&[1, 2, 3])).expect("materialize");

        assert!(has_staged_image(workspace.root()));
        let bytes = fs::read(workspace.input_dir().join(STAGED_IMAGE_FILENAME)).expect("read");
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
