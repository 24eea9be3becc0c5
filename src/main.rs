// =============================================================================
// Stock Scorer — Main Entry Point
// =============================================================================
//
// HTTP service that proxies a market-data provider, computes moving averages
// and RSI over daily closes, and scores each symbol with fixed thresholds.
// Configuration is read once here and passed down; nothing else touches the
// process environment.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod error;
mod fetch;
mod indicators;
mod market_data;
mod runtime_config;
mod signals;
mod types;
mod yahoo;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::{ServiceConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use crate::yahoo::YahooClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── 2. Configuration ─────────────────────────────────────────────────
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = ServiceConfig::load_or_default(&config_path)
        .context("invalid service configuration file")?;
    config
        .apply_env()
        .context("invalid environment override")?;
    config.validate().context("invalid service configuration")?;

    info!(
        host = %config.host,
        port = config.port,
        upstream = %config.upstream_base_url,
        history_range = %config.history_range,
        etf_basket = ?config.etf_basket,
        "Configuration ready"
    );

    // ── 3. Upstream client & shared state ────────────────────────────────
    let provider = YahooClient::new(
        &config.upstream_base_url,
        config.upstream_timeout(),
        &config.user_agent,
        config.history_range.clone(),
    )?;

    let bind_addr = config.bind_addr()?;
    let state = Arc::new(AppState::new(config, Arc::new(provider)));

    // ── 4. Serve until Ctrl+C ────────────────────────────────────────────
    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("Stock scorer shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received — stopping gracefully");
}
