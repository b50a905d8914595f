// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster Orchestrator backend: creates one Pod per job with the guest
//! source mounted from a ConfigMap, watches its phase, streams logs after
//! completion, then deletes it. Grounded in the teacher's Kubernetes agent
//! adapter (`build_pod`, pod-phase polling, scoped namespace client).

use crate::backend::{FailureKind, RunOutcome, RunSpec, RuntimeBackend, RuntimeError};
use async_trait::async_trait;
use isolab_core::JobId;
use k8s_openapi::api::core::v1::{
    ConfigMap, Container, EmptyDirVolumeSource, EnvVar, Pod, PodSpec, ResourceRequirements,
    SecurityContext, Volume, VolumeMount,
};
use k8s_openapi::api::networking::v1::{NetworkPolicy, NetworkPolicySpec};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::{Api, DeleteParams, ListParams, LogParams, PostParams};
use kube::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Drives Pods in a single namespace via the `kube` client.
pub struct ClusterOrchestratorBackend {
    namespace: String,
}

impl ClusterOrchestratorBackend {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into() }
    }

    fn pod_name(job_id: &JobId) -> String {
        format!("isolab-{}", job_id.suffix())
    }

    fn config_map_name(job_id: &JobId) -> String {
        format!("isolab-code-{}", job_id.suffix())
    }

    fn network_policy_name(job_id: &JobId) -> String {
        format!("isolab-netpol-{}", job_id.suffix())
    }

    async fn client(&self) -> Result<Client, RuntimeError> {
        Client::try_default()
            .await
            .map_err(|e| RuntimeError::Backend(format!("kube client: {e}")))
    }

    fn build_config_map(name: &str, spec: &RunSpec, code_text: &str) -> ConfigMap {
        let mut data = BTreeMap::new();
        data.insert("main.py".to_string(), code_text.to_string());
        data.insert("request.json".to_string(), spec.stdin.clone());
        ConfigMap {
            metadata: kube::api::ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(labels(&spec.job_id)),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        }
    }

    /// Denies all ingress and egress for the guest Pod, the cluster-side
    /// equivalent of `docker run --network none`. An empty (but present)
    /// rule list means "allow nothing", per the NetworkPolicy semantics.
    fn build_network_policy(name: &str, spec: &RunSpec) -> NetworkPolicy {
        NetworkPolicy {
            metadata: kube::api::ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(labels(&spec.job_id)),
                ..Default::default()
            },
            spec: Some(NetworkPolicySpec {
                pod_selector: LabelSelector {
                    match_labels: Some(labels(&spec.job_id)),
                    ..Default::default()
                },
                policy_types: Some(vec!["Ingress".to_string(), "Egress".to_string()]),
                ingress: Some(vec![]),
                egress: Some(vec![]),
            }),
            ..Default::default()
        }
    }

    fn build_pod(name: &str, config_map_name: &str, spec: &RunSpec) -> Pod {
        let isolation = spec.isolation;
        let mut limits = BTreeMap::new();
        limits.insert(
            "cpu".to_string(),
            Quantity(format!("{}m", isolation.cpu_limit_millis)),
        );
        limits.insert(
            "memory".to_string(),
            Quantity(format!("{}", isolation.memory_limit_bytes)),
        );

        let security_context = SecurityContext {
            run_as_non_root: Some(isolation.run_as_non_root),
            run_as_user: isolation.run_as_non_root.then_some(1000),
            read_only_root_filesystem: Some(isolation.read_only_root),
            ..Default::default()
        };

        Pod {
            metadata: kube::api::ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(labels(&spec.job_id)),
                ..Default::default()
            },
            spec: Some(PodSpec {
                restart_policy: Some("Never".to_string()),
                containers: vec![Container {
                    name: "guest".to_string(),
                    image: Some(spec.image.clone()),
                    command: Some(vec!["python3".to_string(), "/code/main.py".to_string()]),
                    stdin: Some(true),
                    env: Some(vec![EnvVar {
                        name: "ISOLAB_JOB_ID".to_string(),
                        value: Some(spec.job_id.to_string()),
                        ..Default::default()
                    }]),
                    resources: Some(ResourceRequirements {
                        limits: Some(limits.clone()),
                        requests: Some(limits),
                        ..Default::default()
                    }),
                    security_context: Some(security_context),
                    volume_mounts: Some(vec![
                        VolumeMount {
                            name: "code".to_string(),
                            mount_path: "/code".to_string(),
                            read_only: Some(true),
                            ..Default::default()
                        },
                        VolumeMount {
                            name: "output".to_string(),
                            mount_path: "/output".to_string(),
                            ..Default::default()
                        },
                    ]),
                    ..Default::default()
                }],
                volumes: Some(vec![
                    Volume {
                        name: "code".to_string(),
                        config_map: Some(k8s_openapi::api::core::v1::ConfigMapVolumeSource {
                            name: config_map_name.to_string(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                    Volume {
                        name: "output".to_string(),
                        empty_dir: Some(EmptyDirVolumeSource::default()),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    async fn await_completion(
        pods: &Api<Pod>,
        name: &str,
        deadline: Duration,
    ) -> Result<Option<i32>, RuntimeError> {
        let start = tokio::time::Instant::now();
        loop {
            let pod = pods
                .get(name)
                .await
                .map_err(|e| RuntimeError::Backend(format!("get pod: {e}")))?;
            if let Some(phase) = pod.status.as_ref().and_then(|s| s.phase.as_deref()) {
                match phase {
                    "Succeeded" => return Ok(Some(0)),
                    "Failed" => {
                        let code = pod
                            .status
                            .as_ref()
                            .and_then(|s| s.container_statuses.as_ref())
                            .and_then(|statuses| statuses.first())
                            .and_then(|c| c.state.as_ref())
                            .and_then(|s| s.terminated.as_ref())
                            .map(|t| t.exit_code)
                            .unwrap_or(1);
                        return Ok(Some(code));
                    }
                    _ => {}
                }
            }
            if start.elapsed() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    async fn teardown(&self, client: &Client, name: &str, config_map_name: &str, network_policy_name: &str) {
        let pods: Api<Pod> = Api::namespaced(client.clone(), &self.namespace);
        let _ = pods.delete(name, &DeleteParams::default()).await;
        let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), &self.namespace);
        let _ = config_maps.delete(config_map_name, &DeleteParams::default()).await;
        let policies: Api<NetworkPolicy> = Api::namespaced(client.clone(), &self.namespace);
        let _ = policies.delete(network_policy_name, &DeleteParams::default()).await;
    }
}

fn labels(job_id: &JobId) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), "isolab-guest".to_string());
    labels.insert("isolab.dev/job-id".to_string(), job_id.suffix().to_string());
    labels
}

#[async_trait]
impl RuntimeBackend for ClusterOrchestratorBackend {
    async fn run(&self, spec: RunSpec) -> Result<RunOutcome, RuntimeError> {
        let client = self.client().await?;
        let pods: Api<Pod> = Api::namespaced(client.clone(), &self.namespace);
        let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), &self.namespace);
        let policies: Api<NetworkPolicy> = Api::namespaced(client.clone(), &self.namespace);

        let name = Self::pod_name(&spec.job_id);
        let config_map_name = Self::config_map_name(&spec.job_id);
        let network_policy_name = Self::network_policy_name(&spec.job_id);

        let code_text = std::fs::read_to_string(spec.code_dir.join("main.py")).unwrap_or_default();
        let config_map = Self::build_config_map(&config_map_name, &spec, &code_text);
        config_maps
            .create(&PostParams::default(), &config_map)
            .await
            .map_err(|e| RuntimeError::NotStarted(format!("create configmap: {e}")))?;

        if spec.isolation.network_disabled {
            let network_policy = Self::build_network_policy(&network_policy_name, &spec);
            if let Err(e) = policies.create(&PostParams::default(), &network_policy).await {
                self.teardown(&client, &name, &config_map_name, &network_policy_name).await;
                return Err(RuntimeError::NotStarted(format!("create network policy: {e}")));
            }
        }

        let pod = Self::build_pod(&name, &config_map_name, &spec);
        if let Err(e) = pods.create(&PostParams::default(), &pod).await {
            self.teardown(&client, &name, &config_map_name, &network_policy_name).await;
            return Err(RuntimeError::NotStarted(format!("create pod: {e}")));
        }

        let exit_code = Self::await_completion(&pods, &name, spec.deadline).await;

        let logs = pods
            .logs(&name, &LogParams::default())
            .await
            .unwrap_or_default();

        self.teardown(&client, &name, &config_map_name, &network_policy_name).await;

        match exit_code {
            Ok(Some(code)) => Ok(RunOutcome::guest_exited(code, logs, String::new())),
            Ok(None) => Ok(RunOutcome::timed_out(logs, String::new())),
            Err(e) => Ok(RunOutcome {
                exit_code: None,
                stdout: logs,
                stderr: String::new(),
                failure: Some(FailureKind::BackendError(e.to_string())),
                reported_failure: None,
            }),
        }
    }

    async fn cancel(&self, job_id: &JobId) -> Result<(), RuntimeError> {
        let client = self.client().await?;
        let name = Self::pod_name(job_id);
        let config_map_name = Self::config_map_name(job_id);
        let network_policy_name = Self::network_policy_name(job_id);
        self.teardown(&client, &name, &config_map_name, &network_policy_name).await;
        Ok(())
    }
}

/// List job-ids with a live pod in the namespace, for reconciliation on
/// startup. Mirrors the teacher's pattern of listing by label selector
/// rather than trusting locally-cached state after a restart.
pub async fn list_live_job_ids(
    client: &Client,
    namespace: &str,
) -> Result<Vec<String>, RuntimeError> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let list = pods
        .list(&ListParams::default().labels("app=isolab-guest"))
        .await
        .map_err(|e| RuntimeError::Backend(format!("list pods: {e}")))?;
    Ok(list
        .items
        .into_iter()
        .filter_map(|pod| {
            pod.metadata
                .labels
                .and_then(|labels| labels.get("isolab.dev/job-id").cloned())
        })
        .collect())
}
