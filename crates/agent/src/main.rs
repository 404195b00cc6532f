//! Benchpress Agent - Main Entry Point
//! Composition root: wires the lifecycle to the system adapters

mod config;
mod workload;

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use benchpress_core::application::{cancellation_pair, CleanupRegistry, ExecutionLifecycle};
use benchpress_core::port::ProcessRunner;
use benchpress_infra_sqlite::{create_pool, run_migrations, SqliteStateStore};
use benchpress_infra_system::{
    running_as_root, system_firewall_manager, ElevationMethod, SystemPlatformProbe,
    SystemProcessRunner,
};
use benchpress_sdk::CachingPeerClientFactory;

use crate::config::AgentConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = std::env::var("BENCHPRESS_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("benchpress=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Benchpress agent v{} starting...", VERSION);

    // 2. Load configuration
    let cfg = AgentConfig::load()?;
    let db_path = cfg.state_db_path()?;

    info!(db_path = %db_path.display(), "Initializing state database...");

    // 3. Initialize state database
    let pool = create_pool(&db_path.to_string_lossy())
        .await
        .map_err(|e| anyhow::anyhow!("state DB pool creation failed: {e}"))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("state DB migration failed: {e}"))?;

    // 4. Setup dependencies (DI wiring)
    let state_store = Arc::new(SqliteStateStore::new(pool));
    let cleanup = Arc::new(CleanupRegistry::new());

    let elevation = if running_as_root() {
        ElevationMethod::None
    } else {
        ElevationMethod::Sudo
    };
    let process_runner: Arc<dyn ProcessRunner> =
        Arc::new(SystemProcessRunner::new(cleanup.clone(), elevation));

    let firewall = system_firewall_manager(process_runner.clone());
    let probe = Arc::new(SystemPlatformProbe::new());
    let peer_clients = Arc::new(CachingPeerClientFactory::new(cfg.peer_api_port));

    let workload = workload::create(&cfg.workload, &cfg.parameters)?;
    info!(workload = %cfg.workload, "Workload selected");

    let mut lifecycle = ExecutionLifecycle::new(
        workload,
        probe,
        process_runner,
        firewall,
        state_store,
        peer_clients,
        cleanup,
    )
    .with_layout(cfg.layout.clone())
    .with_local_address(cfg.local_ip()?)
    .with_parameters(cfg.parameters.clone());

    // 5. Ctrl-C -> cooperative cancellation
    let (cancel_source, cancel_token) = cancellation_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received; cancelling workload...");
            cancel_source.cancel();
        }
    });

    // 6. Run the lifecycle; cleanup actions run on every exit path
    match lifecycle.run(cancel_token).await {
        Ok(()) => {
            info!("Shutdown complete.");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Workload run failed");
            std::process::exit(1);
        }
    }
}
