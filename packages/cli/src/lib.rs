// ABOUTME: Casebook server bootstrap shared by the binary
// ABOUTME: Tracing setup, database opening, and the HTTP serve loop

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use sqlx::SqlitePool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use casebook_api::{create_app, DbState};
use casebook_storage::{init_pool_with_path, PoolSettings};

pub mod config;

#[cfg(test)]
mod tests;

use config::Config;

const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Install the global subscriber. `level` wins over `RUST_LOG`; default is `info`.
pub fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init();
}

/// Open the database at `path`, creating and migrating it if needed
pub async fn open_database(path: &Path) -> anyhow::Result<SqlitePool> {
    init_pool_with_path(path, &PoolSettings::default())
        .await
        .with_context(|| format!("failed to open database at {}", path.display()))
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Using database {}", config.db_path.display());

    let (state, worker) = DbState::init_with_path(&config.db_path, &PoolSettings::default())
        .await
        .with_context(|| format!("failed to open database at {}", config.db_path.display()))?;

    let app = create_app(state, &config.cors_origin)
        .with_context(|| format!("invalid CORS origin {:?}", config.cors_origin))?;

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {} (CORS origin: {})", addr, config.cors_origin);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // The app (and with it every notifier handle) is gone; let queued notifications land
    if tokio::time::timeout(WORKER_DRAIN_TIMEOUT, worker).await.is_err() {
        warn!("Notification worker did not drain within {:?}", WORKER_DRAIN_TIMEOUT);
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
