//! Axum router construction.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`].
//! Only `/api/*` routes are rate limited; CORS, request tracing and the
//! security headers wrap everything, including the `404` fallback.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{cors_layer, rate_limit, with_security_headers};
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the monitor server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /health` -- liveness probe
/// - `GET /ws` -- `WebSocket` broadcast stream
/// - `GET /api/sovereignty/status`, `GET /api/wallet/balance`,
///   `GET /api/nodes/status`, `GET /api/stats` -- snapshot reads
/// - `GET /api/logs`, `POST /api/logs` -- log buffer
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/sovereignty/status", get(handlers::sovereignty_status))
        .route("/api/wallet/balance", get(handlers::wallet_balance))
        .route("/api/nodes/status", get(handlers::nodes_status))
        .route("/api/stats", get(handlers::stats))
        .route(
            "/api/logs",
            get(handlers::list_logs).post(handlers::submit_logs),
        )
        .route_layer(from_fn_with_state(Arc::clone(&state), rate_limit));

    let cors = cors_layer(&state.cors_origins);

    let router = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/ws", get(ws::ws_handler))
        .merge(api)
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    with_security_headers(router)
}

/// Router for a dedicated `WebSocket` listener: `GET /ws` only.
pub fn build_ws_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/ws", get(ws::ws_handler))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    with_security_headers(router)
}
