//! Live monitor binary.
//!
//! Wires the broadcast hub, the per-channel scheduler and the HTTP /
//! `WebSocket` listeners together and runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `livemon-config.yaml` (or defaults) with
//!    environment overrides
//! 2. Initialize structured logging (tracing)
//! 3. Build the broadcast hub
//! 4. Start the broadcast timers
//! 5. Start the dedicated `WebSocket` listener, if configured
//! 6. Serve HTTP until `Ctrl-C`, then stop the timers

mod error;

use std::path::Path;
use std::sync::Arc;

use livemon_api::{AppState, ServerConfig};
use livemon_core::config::LoggingConfig;
use livemon_core::{BroadcastHub, BroadcastIntervals, MonitorConfig, spawn_scheduler};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

const CONFIG_PATH: &str = "livemon-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the HTTP listener
/// cannot bind.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = MonitorConfig::load(Path::new(CONFIG_PATH))?;
    init_tracing(&config.logging);

    info!(
        host = config.server.host,
        http_port = config.server.http_port,
        ws_port = ?config.server.ws_port,
        log_capacity = config.log_buffer.capacity,
        rate_limit_max = config.rate_limit.max_requests,
        "Configuration loaded"
    );

    let hub = Arc::new(BroadcastHub::new(config.log_buffer.capacity));
    let scheduler = spawn_scheduler(&hub, BroadcastIntervals::from(&config.broadcast));

    let state = Arc::new(AppState::from_config(Arc::clone(&hub), &config));

    let ws_listener = match ServerConfig::websocket(&config) {
        Some(ws_config) => {
            Some(livemon_api::spawn_ws_server(&ws_config, Arc::clone(&state)).await?)
        }
        None => None,
    };

    let result =
        livemon_api::start_server(&ServerConfig::http(&config), state, shutdown_signal()).await;

    scheduler.shutdown();
    if let Some(handle) = ws_listener {
        handle.abort();
    }
    info!("Live monitor stopped");

    result.map_err(AppError::from)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
