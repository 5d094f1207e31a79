//! HTTP and `WebSocket` API for the live monitor.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) streaming `connected`, snapshot
//!   updates and `log_entry` frames from the shared
//!   [`BroadcastHub`](livemon_core::BroadcastHub)
//! - **REST endpoints** for the current snapshots, counters and the log
//!   buffer, including `POST /api/logs`
//! - **Minimal HTML page** (`GET /`) listing the endpoints
//!
//! # Middleware
//!
//! `/api/*` is rate limited per client IP. Every response carries the
//! security headers and CORS headers; requests are traced with
//! `tower-http`'s `TraceLayer`.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod validation;
pub mod ws;

// Re-export primary types for convenience.
pub use error::{ApiError, FieldError};
pub use router::{build_router, build_ws_router};
pub use server::{ServerConfig, ServerError, bind, serve, start_server};
pub use startup::{StartupError, WsListener, spawn_ws_server};
pub use state::AppState;
