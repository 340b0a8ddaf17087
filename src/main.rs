//! Tracking API - shipment checkpoint service
//!
//! Records status checkpoints for tracked units and serves their history.
//!
//! Module structure:
//! - `domain/` - Core business types (Checkpoint, Unit, statuses, errors)
//! - `io/` - External interfaces (HTTP API, Prometheus text)
//! - `services/` - Business logic (RecordCheckpoint, GetHistory, ListUnits)
//! - `infra/` - Infrastructure (Config, Metrics, stores)

use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use tracking_api::infra::{Config, Metrics};
use tracking_api::io::{start_http_server, AppState};

/// Tracking API - shipment checkpoint service
#[derive(Parser, Debug)]
#[command(name = "tracking-api", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Default: INFO, use RUST_LOG=debug for per-request logs
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(git_hash = %env!("GIT_HASH"), "tracking-api starting");

    let args = Args::parse();
    let config = Config::load(args.config.as_deref());

    info!(
        config_file = %config.config_file(),
        listen_addr = %config.listen_addr(),
        max_body_bytes = %config.max_body_bytes(),
        metrics_interval_secs = %config.metrics_interval_secs(),
        "config_loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics = Arc::new(Metrics::new());
    let state = Arc::new(AppState::in_memory(&config, metrics));

    // Periodic metrics summary (0 disables)
    let interval_secs = config.metrics_interval_secs();
    if interval_secs > 0 {
        let reporter_state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
            interval.tick().await;
            loop {
                interval.tick().await;
                reporter_state.metrics_summary(true).await.log();
            }
        });
    }

    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    if let Err(e) = start_http_server(&config, state, shutdown_rx).await {
        tracing::error!(error = %e, listen_addr = %config.listen_addr(), "http_server_error");
        return Err(e);
    }

    info!("tracking-api shutdown complete");
    Ok(())
}
