//! REST endpoint handlers.
//!
//! Reads go straight to the shared [`BroadcastHub`](livemon_core::BroadcastHub);
//! the only write is `POST /api/logs`, which appends and broadcasts each
//! entry before responding.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/health` | Liveness and uptime |
//! | `GET` | `/api/sovereignty/status` | Current sovereignty snapshot |
//! | `GET` | `/api/wallet/balance` | Current wallet snapshot |
//! | `GET` | `/api/nodes/status` | Node table with health counts |
//! | `GET` | `/api/stats` | Connection and broadcast counters |
//! | `GET` | `/api/logs` | Page through buffered logs, newest first |
//! | `POST` | `/api/logs` | Submit log entries |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse};
use livemon_types::NodeHealth;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{self, LogsQuery, SubmitLogsRequest};

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing server status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let connections = state.hub.connection_count().await;
    let uptime = state.hub.uptime_seconds();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Live Monitor</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Live Monitor</h1>
    <p>Status: <span class="status">RUNNING</span></p>
    <p>Uptime: {uptime}s &middot; WebSocket clients: {connections}</p>
    <h2>Endpoints</h2>
    <ul>
        <li>GET <a href="/health">/health</a></li>
        <li>GET <a href="/api/sovereignty/status">/api/sovereignty/status</a></li>
        <li>GET <a href="/api/wallet/balance">/api/wallet/balance</a></li>
        <li>GET <a href="/api/nodes/status">/api/nodes/status</a></li>
        <li>GET <a href="/api/stats">/api/stats</a></li>
        <li>GET <a href="/api/logs">/api/logs</a>?limit=&amp;offset=</li>
        <li>POST /api/logs</li>
        <li>WS /ws</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": state.hub.now(),
        "uptime": state.hub.uptime_seconds(),
        "connections": state.hub.connection_count().await,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---------------------------------------------------------------------------
// Snapshot reads
// ---------------------------------------------------------------------------

/// `GET /api/sovereignty/status`
pub async fn sovereignty_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.hub.sovereignty().await)
}

/// `GET /api/wallet/balance`
pub async fn wallet_balance(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.hub.wallet().await)
}

/// `GET /api/nodes/status`
///
/// Returns the node table plus a count per health state.
pub async fn nodes_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let nodes = state.hub.nodes().await;
    let count = |health: NodeHealth| nodes.iter().filter(|n| n.health == health).count();

    Ok(Json(serde_json::json!({
        "total": nodes.len(),
        "online": count(NodeHealth::Online),
        "degraded": count(NodeHealth::Degraded),
        "offline": count(NodeHealth::Offline),
        "timestamp": state.hub.now(),
        "nodes": serde_json::to_value(&nodes)?,
    })))
}

/// `GET /api/stats`
pub async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.hub.stats().await)
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

/// `GET /api/logs` -- page through buffered records, newest first.
///
/// # Query Parameters
///
/// - `limit`: 1..=100 (default 50)
/// - `offset`: records to skip from the newest (default 0)
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = query.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    validation::validate(&params)?;

    let limit = params.limit();
    let offset = params.offset();
    let page = state
        .hub
        .query_logs(
            usize::try_from(limit).unwrap_or(usize::MAX),
            usize::try_from(offset).unwrap_or(usize::MAX),
        )
        .await;

    Ok(Json(serde_json::json!({
        "logs": serde_json::to_value(&page.logs)?,
        "total": page.total,
        "limit": limit,
        "offset": offset,
    })))
}

/// `POST /api/logs` -- append entries and broadcast each as `log_entry`.
///
/// Responds `201` with the stored records, ids assigned.
pub async fn submit_logs(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SubmitLogsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    validation::validate(&request)?;

    let now = state.hub.now();
    let drafts = request
        .entries
        .into_iter()
        .map(|entry| entry.into_draft(now))
        .collect();
    let stored = state.hub.submit_logs(drafts).await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "added": stored.len(),
            "logs": serde_json::to_value(&stored)?,
        })),
    ))
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// `404` for any unmatched path.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Route {} not found", uri.path()))
}
