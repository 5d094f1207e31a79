//! Shared application state for the API server.
//!
//! [`AppState`] wraps the [`BroadcastHub`] that the scheduler also drives,
//! plus the request-level pieces only the HTTP layer needs: the per-IP
//! rate limiter and the allowed CORS origins.

use std::sync::Arc;

use livemon_core::BroadcastHub;
use livemon_core::config::{MonitorConfig, RateLimitConfig};

use crate::middleware::RateLimiter;

/// State shared by every handler, held in an `Arc`.
#[derive(Debug)]
pub struct AppState {
    /// Log buffer, snapshots and connection registry.
    pub hub: Arc<BroadcastHub>,
    /// Fixed-window counters for `/api/*`.
    pub rate_limiter: RateLimiter,
    /// Allowed CORS origins; empty means any origin.
    pub cors_origins: Vec<String>,
}

impl AppState {
    /// State with default rate limits and permissive CORS.
    pub fn new(hub: Arc<BroadcastHub>) -> Self {
        Self {
            hub,
            rate_limiter: RateLimiter::new(&RateLimitConfig::default()),
            cors_origins: Vec::new(),
        }
    }

    /// State configured from the loaded monitor configuration.
    pub fn from_config(hub: Arc<BroadcastHub>, config: &MonitorConfig) -> Self {
        Self {
            hub,
            rate_limiter: RateLimiter::new(&config.rate_limit),
            cors_origins: config.cors.allowed_origins.clone(),
        }
    }
}
