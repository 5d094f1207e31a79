//! `WebSocket` endpoint.
//!
//! Each upgraded socket registers with the hub and then runs one
//! `select!` loop: frames queued for the connection (greeting, broadcasts,
//! replies) are written out in order, and inbound text frames go to
//! [`protocol::handle_text`]. Whatever ends the loop, including the task
//! being dropped mid-await, a [`Registration`] guard unregisters the
//! connection; [`BroadcastHub::disconnect`] ignores ids it no longer holds.

use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use livemon_core::{BroadcastHub, protocol};
use livemon_types::ConnectionId;
use tracing::debug;

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(|socket| handle_ws(socket, hub))
}

/// Keeps a connection registered until released or dropped.
struct Registration {
    hub: Arc<BroadcastHub>,
    id: ConnectionId,
    released: bool,
}

impl Registration {
    const fn new(hub: Arc<BroadcastHub>, id: ConnectionId) -> Self {
        Self {
            hub,
            id,
            released: false,
        }
    }

    async fn release(mut self) {
        self.hub.disconnect(self.id).await;
        self.released = true;
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let hub = Arc::clone(&self.hub);
        let id = self.id;
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                hub.disconnect(id).await;
            });
        }
    }
}

async fn handle_ws(mut socket: WebSocket, hub: Arc<BroadcastHub>) {
    let (id, mut outbound) = hub.connect().await;
    let registration = Registration::new(Arc::clone(&hub), id);

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    break;
                };
                if socket.send(Message::Text(Utf8Bytes::from(&*frame))).await.is_err() {
                    debug!(client_id = %id, "WebSocket send failed");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = protocol::handle_text(id, text.as_str(), hub.now()) {
                            hub.send_to(id, &reply).await;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(client_id = %id, "WebSocket pong failed");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(client_id = %id, error = %e, "WebSocket error");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary and pong frames carry nothing for us.
                    }
                }
            }
        }
    }

    registration.release().await;
}
