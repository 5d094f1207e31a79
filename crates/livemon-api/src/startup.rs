//! Background listener for a dedicated `WebSocket` port.
//!
//! When `server.ws_port` differs from the HTTP port, the binary calls
//! [`spawn_ws_server`] so `WebSocket` clients can connect on their own
//! listener while the main router keeps serving `/ws` as well.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::router::build_ws_router;
use crate::server::{ServerConfig, ServerError, bind, serve};
use crate::state::AppState;

/// Errors that can occur when spawning the `WebSocket` listener.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The listener failed to bind.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A dedicated `WebSocket` listener running on a background task.
#[derive(Debug)]
pub struct WsListener {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl WsListener {
    /// Address the listener is bound to.
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Bind `config` and serve the `WebSocket`-only router on a background task.
///
/// Binding happens before the task is spawned, so a taken port is reported
/// here rather than logged later. The task runs until aborted.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_ws_server(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<WsListener, StartupError> {
    let listener = bind(config).await?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;
    let router = build_ws_router(state);

    let task = tokio::spawn(async move {
        if let Err(e) = serve(listener, router, std::future::pending()).await {
            tracing::error!(error = %e, "WebSocket listener exited with error");
        }
    });

    tracing::info!(%local_addr, "WebSocket listener spawned on background task");

    Ok(WsListener { local_addr, task })
}
