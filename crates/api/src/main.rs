// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `isolabd` — the admission process. Reads `EngineConfig` from the
//! environment, wires up the runtime backend the config selects, and
//! serves the HTTP surface (§6) until told to shut down.

use isolab_api::{build_router, AppState};
use isolab_core::{EngineConfig, RuntimeKind};
use isolab_engine::{InMemoryImageLibrary, JobManager};
use isolab_logger::LogStore;
use isolab_runtime::{ClusterOrchestratorBackend, LocalDaemonBackend, RuntimeBackend};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = EngineConfig::from_env()?;
    tracing::info!(runtime = %config.runtime, bind_addr = %config.bind_addr, "starting isolabd");

    let backend: Arc<dyn RuntimeBackend> = match config.runtime {
        RuntimeKind::LocalDaemon => Arc::new(LocalDaemonBackend::new()),
        RuntimeKind::ClusterOrchestrator => {
            Arc::new(ClusterOrchestratorBackend::new(config.kubernetes_namespace.clone()))
        }
    };

    let logger = Arc::new(LogStore::new(config.log_store_dir.clone()));
    let image_library = Arc::new(InMemoryImageLibrary::new());
    let workspace_root = config.log_store_dir.join("outputs");
    let output_retention = Duration::from_secs(config.output_retention_secs);
    let runtime_label = config.runtime.to_string();
    let bind_addr = config.bind_addr.clone();

    let jobs = Arc::new(JobManager::new(backend, logger.clone(), image_library, config, workspace_root));

    let state = AppState {
        jobs,
        logger,
        output_retention,
        started_at: Instant::now(),
        runtime_label,
    };

    let app = build_router(state);
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(bind_addr = %bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("isolabd shut down cleanly");
    Ok(())
}

/// Waits on SIGINT or SIGTERM. In-flight jobs are left to the Job Manager's
/// own deadline handling; axum stops accepting new connections the moment
/// this future resolves and waits for in-flight requests to finish.
async fn shutdown_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, draining"),
        _ = terminate => tracing::info!("received SIGTERM, draining"),
    }
}
