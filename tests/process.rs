// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box process lifecycle specs for `isolabd`.

use crate::prelude::{isolabd_path, wait_for, Daemon, WAIT_MAX_MS};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serial_test::serial;
use std::process::{Command, Stdio};

#[test]
#[serial]
fn health_and_version_respond() {
    let daemon = Daemon::start(18_311);

    let health: serde_json::Value =
        reqwest::blocking::get(format!("{}/health", daemon.base_url)).expect("health request").json().expect("json");
    assert_eq!(health["status"], "ok");

    let version: serde_json::Value =
        reqwest::blocking::get(format!("{}/version", daemon.base_url)).expect("version request").json().expect("json");
    assert_eq!(version["runtime"], "docker");
}

#[test]
#[serial]
fn unknown_route_is_404() {
    let daemon = Daemon::start(18_312);

    let response = reqwest::blocking::get(format!("{}/no-such-route", daemon.base_url)).expect("request");
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

/// A malformed `EXECUTION_RUNTIME` value must be rejected at startup,
/// before the process ever binds a socket.
#[test]
fn invalid_runtime_config_exits_nonzero() {
    let isolabd = isolabd_path();
    let data_dir = tempfile::tempdir().expect("tempdir");

    let assert = assert_cmd::Command::new(isolabd)
        .env("BIND_ADDR", "127.0.0.1:18313")
        .env("LOG_STORE_DIR", data_dir.path())
        .env("EXECUTION_RUNTIME", "podman")
        .env("RUST_LOG", "error")
        .timeout(std::time::Duration::from_secs(5))
        .assert();

    assert.failure();
}

#[test]
#[serial]
fn sigterm_drains_and_exits_cleanly() {
    let isolabd = isolabd_path();
    let data_dir = tempfile::tempdir().expect("tempdir");
    let bind_addr = "127.0.0.1:18314";

    let mut child = Command::new(&isolabd)
        .env("BIND_ADDR", bind_addr)
        .env("LOG_STORE_DIR", data_dir.path())
        .env("EXECUTION_RUNTIME", "docker")
        .env("RUST_LOG", "warn")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn isolabd");

    let ready = wait_for(WAIT_MAX_MS, || {
        reqwest::blocking::get(format!("http://{bind_addr}/health")).map(|r| r.status().is_success()).unwrap_or(false)
    });
    assert!(ready, "isolabd did not become healthy in time");

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).expect("send SIGTERM");

    let exited = wait_for(WAIT_MAX_MS, || matches!(child.try_wait(), Ok(Some(_))));
    assert!(exited, "isolabd did not exit after SIGTERM");

    let status = child.wait().expect("wait");
    assert!(status.success(), "isolabd should exit 0 on a clean SIGTERM drain");
}
