//! Inbound `WebSocket` frame handling.
//!
//! The only control frame with defined behavior is `subscribe`, answered
//! with `subscribed`. Subscribing does not filter anything: every
//! connection keeps receiving every channel. Malformed frames and unknown
//! types produce no reply and never close the connection.

use livemon_types::{ClientMessage, ConnectionId, ServerMessage, SubscribedPayload};
use tracing::{debug, warn};

/// Interpret one inbound text frame and return the reply, if any.
pub fn handle_text(id: ConnectionId, frame: &str, now: i64) -> Option<ServerMessage> {
    let message = match ClientMessage::parse(frame) {
        Ok(message) => message,
        Err(e) => {
            warn!(client_id = %id, error = %e, "Ignoring malformed WebSocket frame");
            return None;
        }
    };

    match message {
        ClientMessage::Subscribe { channels } => {
            debug!(client_id = %id, %channels, "Client subscribed");
            Some(ServerMessage::Subscribed(SubscribedPayload {
                channels,
                timestamp: now,
            }))
        }
        ClientMessage::Unknown { kind } => {
            debug!(client_id = %id, kind, "Ignoring unknown message type");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_is_acknowledged_with_echoed_channels() {
        let reply = handle_text(
            ConnectionId::new(),
            r#"{"type":"subscribe","channels":["sovereignty","logs"]}"#,
            1234,
        );
        assert_eq!(
            reply,
            Some(ServerMessage::Subscribed(SubscribedPayload {
                channels: serde_json::json!(["sovereignty", "logs"]),
                timestamp: 1234,
            }))
        );
    }

    #[test]
    fn malformed_frame_yields_no_reply() {
        assert!(handle_text(ConnectionId::new(), "{not json", 0).is_none());
        assert!(handle_text(ConnectionId::new(), "42", 0).is_none());
    }

    #[test]
    fn unknown_type_yields_no_reply() {
        assert!(handle_text(ConnectionId::new(), r#"{"type":"unsubscribe"}"#, 0).is_none());
    }

    #[test]
    fn subscribe_after_garbage_still_works() {
        let id = ConnectionId::new();
        assert!(handle_text(id, "garbage", 0).is_none());
        assert!(matches!(
            handle_text(id, r#"{"type":"subscribe","channels":[]}"#, 0),
            Some(ServerMessage::Subscribed(_))
        ));
    }
}
