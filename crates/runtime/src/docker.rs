// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local Daemon backend: shells out to the `docker` CLI, the same way the
//! teacher's container adapter drives `docker run`/`docker volume
//! create`/`docker kill` rather than linking a client library.

use crate::backend::{FailureKind, RunOutcome, RunSpec, RuntimeBackend, RuntimeError};
use async_trait::async_trait;
use isolab_core::JobId;
use isolab_protocol::confirmation::Confirmation;
use isolab_protocol::marker::Marker;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// Reads the guest's stdout line by line, answering any marker that asks
/// for a confirmation so the guest never blocks waiting on stdin. Plain
/// (non-marker) lines are accumulated and returned as captured stdout;
/// the last `report_failure` marker seen, if any, is surfaced separately.
///
/// Confirmations are always a bare `Confirmation::ok()` reply: this backend
/// has no way to evaluate a marker's semantic request (tile existence, file
/// storage, etc.) — that belongs to the engine, which only sees the
/// terminal `RunOutcome` after this loop exits. Replying affirmatively
/// unblocks the guest; anything that actually needed the reply's content
/// shows up as a mismatch in harvested output, not a hang.
async fn pump_markers(
    mut stdout: impl tokio::io::AsyncRead + Unpin,
    mut stdin: impl tokio::io::AsyncWrite + Unpin,
) -> (String, Option<String>) {
    let mut lines = BufReader::new(&mut stdout).lines();
    let mut plain = String::new();
    let mut reported_failure = None;

    while let Ok(Some(line)) = lines.next_line().await {
        match Marker::parse(&line) {
            Ok(marker) => {
                if marker.awaits_confirmation() {
                    let reply = serde_json::to_string(&Confirmation::ok())
                        .unwrap_or_else(|_| "{\"is_success\":true}".to_string());
                    let _ = stdin.write_all(reply.as_bytes()).await;
                    let _ = stdin.write_all(b"\n").await;
                    let _ = stdin.flush().await;
                }
                if marker.name == isolab_protocol::marker::MarkerName::ReportFailure {
                    reported_failure = marker
                        .args
                        .get("message")
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_string);
                }
            }
            Err(_) => {
                plain.push_str(&line);
                plain.push('\n');
            }
        }
    }

    (plain, reported_failure)
}

/// Drives containers via the `docker` CLI on the local host.
pub struct LocalDaemonBackend {
    containers: Arc<Mutex<HashMap<JobId, String>>>,
}

impl LocalDaemonBackend {
    pub fn new() -> Self {
        Self { containers: Arc::new(Mutex::new(HashMap::new())) }
    }

    fn container_name(job_id: &JobId) -> String {
        format!("isolab-{}", job_id.suffix())
    }

    async fn run_inner(&self, spec: &RunSpec, name: &str) -> Result<RunOutcome, RuntimeError> {
        let isolation = spec.isolation;
        let mut cmd = Command::new("docker");
        cmd.arg("run")
            .arg("--rm")
            .arg("-i")
            .arg("--name")
            .arg(name)
            .arg("--user")
            .arg(if isolation.run_as_non_root { "1000:1000" } else { "0:0" })
            .arg(format!("--cpus={:.3}", isolation.cpu_limit_millis as f64 / 1000.0))
            .arg(format!("--memory={}", isolation.memory_limit_bytes))
            .arg("-v")
            .arg(format!("{}:/code:ro", spec.code_dir.display()))
            .arg("-v")
            .arg(format!("{}:/input:ro", spec.input_dir.display()))
            .arg("-v")
            .arg(format!("{}:/output", spec.output_dir.display()));
        if isolation.network_disabled {
            cmd.arg("--network").arg("none");
        }
        if isolation.read_only_root {
            cmd.arg("--read-only").arg("--tmpfs").arg("/tmp");
        }
        cmd.arg(&spec.image)
            .arg("python3")
            .arg("/code/main.py")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| RuntimeError::NotStarted(format!("failed to spawn docker: {e}")))?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            RuntimeError::Backend("docker child had no stdin pipe".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            RuntimeError::Backend("docker child had no stdout pipe".to_string())
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            RuntimeError::Backend("docker child had no stderr pipe".to_string())
        })?;

        stdin
            .write_all(spec.stdin.as_bytes())
            .await
            .map_err(|e| RuntimeError::Backend(format!("write stdin: {e}")))?;

        let stderr_task = tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let (plain_stdout, reported_failure) = pump_markers(stdout, stdin).await;

        let stderr_text = stderr_task.await.unwrap_or_default();

        let status = child
            .wait()
            .await
            .map_err(|e| RuntimeError::Backend(format!("wait docker: {e}")))?;

        match status.code() {
            Some(code) => Ok(RunOutcome::guest_exited_with_report(
                code,
                plain_stdout,
                stderr_text,
                reported_failure,
            )),
            None => Ok(RunOutcome {
                exit_code: None,
                stdout: plain_stdout,
                stderr: stderr_text,
                failure: Some(FailureKind::Cancelled),
                reported_failure,
            }),
        }
    }
}

impl Default for LocalDaemonBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuntimeBackend for LocalDaemonBackend {
    async fn run(&self, spec: RunSpec) -> Result<RunOutcome, RuntimeError> {
        let name = Self::container_name(&spec.job_id);
        self.containers.lock().insert(spec.job_id, name.clone());

        let result = tokio::time::timeout(spec.deadline, self.run_inner(&spec, &name)).await;

        self.containers.lock().remove(&spec.job_id);

        match result {
            Ok(run_result) => run_result,
            Err(_elapsed) => {
                let _ = Command::new("docker").arg("kill").arg(&name).output().await;
                Ok(RunOutcome::timed_out(String::new(), String::new()))
            }
        }
    }

    async fn cancel(&self, job_id: &JobId) -> Result<(), RuntimeError> {
        let name = { self.containers.lock().get(job_id).cloned() };
        if let Some(name) = name {
            let _ = Command::new("docker").arg("kill").arg(&name).output().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_name_is_derived_from_job_id_suffix() {
        let job_id = JobId::new();
        let name = LocalDaemonBackend::container_name(&job_id);
        assert!(name.starts_with("isolab-"));
        assert!(name.ends_with(job_id.suffix()));
    }
}
