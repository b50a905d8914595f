// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test scaffolding: spawn `isolabd` as a child process against a
//! throwaway data directory, poll for readiness, tear down on drop.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const WAIT_MAX_MS: u64 = 5_000;

/// `isolabd` lives in a sibling package (`isolab-api`), so
/// `assert_cmd::cargo_bin` (which only resolves binaries of the package
/// under test) can't find it. Cargo still builds it into the same
/// `target/<profile>/` directory as this test binary, so walk up from our
/// own executable to find it.
pub fn isolabd_path() -> PathBuf {
    let mut path = std::env::current_exe().expect("current_exe");
    path.pop(); // deps/
    path.pop(); // <profile>/
    let exe_name = if cfg!(windows) { "isolabd.exe" } else { "isolabd" };
    path.push(exe_name);
    assert!(path.exists(), "isolabd binary not found at {}", path.display());
    path
}

/// Poll `predicate` until it returns `true` or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if predicate() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}

/// A running `isolabd` instance bound to a fixed loopback port. Tests that
/// use this must be `#[serial]` (see `serial_test`) since the port is
/// shared across the whole test binary.
pub struct Daemon {
    child: Child,
    pub base_url: String,
    _data_dir: TempDir,
}

impl Daemon {
    pub fn start(port: u16) -> Self {
        let data_dir = tempfile::tempdir().expect("tempdir");
        let bind_addr = format!("127.0.0.1:{port}");

        let mut command = Command::new(isolabd_path());
        command
            .env("BIND_ADDR", &bind_addr)
            .env("LOG_STORE_DIR", data_dir.path())
            .env("EXECUTION_RUNTIME", "docker")
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = command.spawn().expect("spawn isolabd");
        let base_url = format!("http://{bind_addr}");

        let daemon = Self { child, base_url, _data_dir: data_dir };
        let ready = wait_for(WAIT_MAX_MS, || daemon.health_ok());
        assert!(ready, "isolabd did not become healthy in time");
        daemon
    }

    fn health_ok(&self) -> bool {
        reqwest::blocking::get(format!("{}/health", self.base_url))
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
