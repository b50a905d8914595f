// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed engine configuration, built once at startup from the environment
//! variables named in the execution contract (`EXECUTION_RUNTIME`,
//! `RUNNER_IMAGE`, `SCRIPT_TIMEOUT`, `KUBERNETES_NAMESPACE`,
//! `HOST_PROJECT_DIR`) plus the ambient-stack variables (`BIND_ADDR`,
//! `LOG_STORE_DIR`, `MAX_CONCURRENT_JOBS`, `DIAGNOSTIC_FAILURE_THRESHOLD`,
//! `OUTPUT_RETENTION_SECS`). Nothing downstream reads the environment
//! directly; everything consults this struct.

use crate::error::ConfigError;
use std::path::PathBuf;

/// Which container runtime backs the engine for this process's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    LocalDaemon,
    ClusterOrchestrator,
}

crate::simple_display! {
    RuntimeKind {
        LocalDaemon => "docker",
        ClusterOrchestrator => "kubernetes",
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub runtime: RuntimeKind,
    pub runner_image: String,
    pub script_timeout_secs: u64,
    pub kubernetes_namespace: String,
    pub host_project_dir: Option<PathBuf>,
    pub bind_addr: String,
    pub log_store_dir: PathBuf,
    pub max_concurrent_jobs: usize,
    pub diagnostic_failure_threshold: u32,
    pub output_retention_secs: u64,
}

/// Reads a single named environment variable, falling back to `default`.
/// Kept as a trait so tests can supply a fake environment instead of
/// mutating `std::env` (which is process-global and racy under `cargo
/// test`'s default threaded runner).
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EngineConfig {
    pub const DEFAULT_SCRIPT_TIMEOUT_SECS: u64 = 600;
    pub const DEFAULT_BIND_ADDR: &'static str = "0.0.0.0:8080";
    pub const DEFAULT_LOG_STORE_DIR: &'static str = "./data";
    pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 8;
    pub const DEFAULT_DIAGNOSTIC_FAILURE_THRESHOLD: u32 = 2;
    pub const DEFAULT_OUTPUT_RETENTION_SECS: u64 = 86_400;

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(env: &impl EnvSource) -> Result<Self, ConfigError> {
        let runtime = match env.get("EXECUTION_RUNTIME").as_deref() {
            Some("docker") => RuntimeKind::LocalDaemon,
            Some("kubernetes") => RuntimeKind::ClusterOrchestrator,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "EXECUTION_RUNTIME",
                    value: other.to_string(),
                })
            }
            None => {
                if env.get("KUBERNETES_SERVICE_HOST").is_some() {
                    RuntimeKind::ClusterOrchestrator
                } else {
                    RuntimeKind::LocalDaemon
                }
            }
        };

        let script_timeout_secs = parse_u64(
            env,
            "SCRIPT_TIMEOUT",
            Self::DEFAULT_SCRIPT_TIMEOUT_SECS,
        )?;
        let max_concurrent_jobs =
            parse_u64(env, "MAX_CONCURRENT_JOBS", Self::DEFAULT_MAX_CONCURRENT_JOBS as u64)?
                as usize;
        let diagnostic_failure_threshold = parse_u64(
            env,
            "DIAGNOSTIC_FAILURE_THRESHOLD",
            Self::DEFAULT_DIAGNOSTIC_FAILURE_THRESHOLD as u64,
        )? as u32;
        let output_retention_secs = parse_u64(
            env,
            "OUTPUT_RETENTION_SECS",
            Self::DEFAULT_OUTPUT_RETENTION_SECS,
        )?;

        Ok(Self {
            runtime,
            runner_image: env
                .get("RUNNER_IMAGE")
                .unwrap_or_else(|| "isolab-runner:latest".to_string()),
            script_timeout_secs,
            kubernetes_namespace: env
                .get("KUBERNETES_NAMESPACE")
                .unwrap_or_else(|| "default".to_string()),
            host_project_dir: env.get("HOST_PROJECT_DIR").map(PathBuf::from),
            bind_addr: env
                .get("BIND_ADDR")
                .unwrap_or_else(|| Self::DEFAULT_BIND_ADDR.to_string()),
            log_store_dir: env
                .get("LOG_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_LOG_STORE_DIR)),
            max_concurrent_jobs,
            diagnostic_failure_threshold,
            output_retention_secs,
        })
    }
}

fn parse_u64(env: &impl EnvSource, var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env.get(var) {
        None => Ok(default),
        Some(raw) => {
            let value: u64 = raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var, value: raw.clone() })?;
            if value == 0 {
                return Err(ConfigError::MustBePositive { var, value });
            }
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeEnv(HashMap<&'static str, &'static str>);

    impl EnvSource for FakeEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|s| s.to_string())
        }
    }

    #[test]
    fn defaults_to_local_daemon_with_no_markers() {
        let env = FakeEnv(HashMap::new());
        let config = EngineConfig::from_source(&env).unwrap();
        assert_eq!(config.runtime, RuntimeKind::LocalDaemon);
        assert_eq!(config.script_timeout_secs, EngineConfig::DEFAULT_SCRIPT_TIMEOUT_SECS);
    }

    #[test]
    fn cluster_marker_selects_cluster_orchestrator() {
        let mut map = HashMap::new();
        map.insert("KUBERNETES_SERVICE_HOST", "10.0.0.1");
        let config = EngineConfig::from_source(&FakeEnv(map)).unwrap();
        assert_eq!(config.runtime, RuntimeKind::ClusterOrchestrator);
    }

    #[test]
    fn explicit_runtime_overrides_cluster_marker() {
        let mut map = HashMap::new();
        map.insert("KUBERNETES_SERVICE_HOST", "10.0.0.1");
        map.insert("EXECUTION_RUNTIME", "docker");
        let config = EngineConfig::from_source(&FakeEnv(map)).unwrap();
        assert_eq!(config.runtime, RuntimeKind::LocalDaemon);
    }

    #[test]
    fn rejects_unknown_runtime_value() {
        let mut map = HashMap::new();
        map.insert("EXECUTION_RUNTIME", "podman");
        let err = EngineConfig::from_source(&FakeEnv(map)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue { var: "EXECUTION_RUNTIME", value: "podman".to_string() }
        );
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut map = HashMap::new();
        map.insert("SCRIPT_TIMEOUT", "0");
        let err = EngineConfig::from_source(&FakeEnv(map)).unwrap_err();
        assert_eq!(err, ConfigError::MustBePositive { var: "SCRIPT_TIMEOUT", value: 0 });
    }
}
