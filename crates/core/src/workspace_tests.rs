// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn ws() -> Workspace {
    Workspace::new(PathBuf::from("/var/isolab/jobs/job-abc"))
}

#[test]
fn subtrees_are_nested_under_root() {
    let w = ws();
    assert_eq!(w.code_dir(), PathBuf::from("/var/isolab/jobs/job-abc/code"));
    assert_eq!(w.input_dir(), PathBuf::from("/var/isolab/jobs/job-abc/input"));
    assert_eq!(w.output_dir(), PathBuf::from("/var/isolab/jobs/job-abc/output"));
    assert_eq!(w.code_file(), PathBuf::from("/var/isolab/jobs/job-abc/code/main.py"));
}

#[test]
fn resolves_plain_relative_path() {
    let w = ws();
    let resolved = w.resolve_output_path("result.png").unwrap();
    assert_eq!(resolved, PathBuf::from("/var/isolab/jobs/job-abc/output/result.png"));
}

#[test]
fn resolves_nested_relative_path() {
    let w = ws();
    let resolved = w.resolve_output_path("tiles/0/0.png").unwrap();
    assert_eq!(
        resolved,
        PathBuf::from("/var/isolab/jobs/job-abc/output/tiles/0/0.png")
    );
}

#[test]
fn rejects_absolute_path() {
    let w = ws();
    assert_eq!(
        w.resolve_output_path("/etc/passwd"),
        Err(WorkspaceError::NotRelative("/etc/passwd".to_string()))
    );
}

#[test]
fn rejects_parent_escape() {
    let w = ws();
    assert_eq!(
        w.resolve_output_path("../secrets.txt"),
        Err(WorkspaceError::PathEscape("../secrets.txt".to_string()))
    );
}

#[test]
fn rejects_embedded_parent_escape() {
    let w = ws();
    assert_eq!(
        w.resolve_output_path("tiles/../../escape.png"),
        Err(WorkspaceError::PathEscape("tiles/../../escape.png".to_string()))
    );
}
