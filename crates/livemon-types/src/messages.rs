//! `WebSocket` message envelopes.
//!
//! Every frame is a JSON text frame of the form `{"type": ..., "payload": ...}`.
//! Outbound frames are modelled by [`ServerMessage`]; inbound frames by
//! [`ClientMessage`], which keeps unrecognized `type` values as a
//! first-class [`ClientMessage::Unknown`] variant instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::ConnectionId;
use crate::structs::{LogRecord, NodeStatus, Sovereignty, Wallet};

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// Payload of the `connected` greeting sent right after the upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    /// Identifier assigned to this connection.
    pub client_id: ConnectionId,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Human-readable greeting.
    pub message: String,
}

/// Payload of the `subscribed` acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribedPayload {
    /// The `channels` field of the request, echoed back unchanged.
    pub channels: Value,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// A frame sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Greeting sent once per connection before anything else.
    Connected(ConnectedPayload),
    /// Acknowledgment of a `subscribe` request.
    Subscribed(SubscribedPayload),
    /// Periodic sovereignty snapshot.
    SovereigntyUpdate(Sovereignty),
    /// Periodic wallet snapshot.
    WalletUpdate(Wallet),
    /// Periodic node health table.
    NodeStatus(Vec<NodeStatus>),
    /// A newly appended log record.
    LogEntry(LogRecord),
}

impl ServerMessage {
    /// The `type` tag this message carries on the wire.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::Subscribed(_) => "subscribed",
            Self::SovereigntyUpdate(_) => "sovereignty_update",
            Self::WalletUpdate(_) => "wallet_update",
            Self::NodeStatus(_) => "node_status",
            Self::LogEntry(_) => "log_entry",
        }
    }
}

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// Reasons an inbound text frame could not be decoded at all.
#[derive(Debug, thiserror::Error)]
pub enum ClientMessageError {
    /// The frame is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame is JSON but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// The object has no string `type` field.
    #[error("frame has no string \"type\" field")]
    MissingType,
}

/// A frame sent from a client to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Request to subscribe to broadcast channels.
    Subscribe {
        /// The requested channels exactly as sent (normally an array of names).
        channels: Value,
    },
    /// Any other `type` value.
    Unknown {
        /// The unrecognized `type` tag.
        kind: String,
    },
}

impl ClientMessage {
    /// Decode a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientMessageError`] if the frame is not a JSON object
    /// with a string `type` field. Unrecognized types are not errors.
    pub fn parse(text: &str) -> Result<Self, ClientMessageError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// See [`ClientMessage::parse`].
    pub fn from_value(value: Value) -> Result<Self, ClientMessageError> {
        let Value::Object(mut fields) = value else {
            return Err(ClientMessageError::NotAnObject);
        };

        let Some(Value::String(kind)) = fields.remove("type") else {
            return Err(ClientMessageError::MissingType);
        };

        if kind == "subscribe" {
            let channels = fields.remove("channels").unwrap_or(Value::Null);
            Ok(Self::Subscribe { channels })
        } else {
            Ok(Self::Unknown { kind })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn server_message_envelope_shape() {
        let msg = ServerMessage::Subscribed(SubscribedPayload {
            channels: serde_json::json!(["logs"]),
            timestamp: 5,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "subscribed");
        assert_eq!(json["payload"]["channels"][0], "logs");
        assert_eq!(json["payload"]["timestamp"], 5);
        assert_eq!(msg.kind(), "subscribed");
    }

    #[test]
    fn node_status_tag_is_snake_case() {
        let json = serde_json::to_value(ServerMessage::NodeStatus(Vec::new())).unwrap();
        assert_eq!(json["type"], "node_status");
        assert_eq!(json["payload"], serde_json::json!([]));
    }

    #[test]
    fn connected_payload_uses_client_id_key() {
        let msg = ServerMessage::Connected(ConnectedPayload {
            client_id: ConnectionId::new(),
            timestamp: 1,
            message: String::from("hi"),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json["payload"]["clientId"].is_string());
    }

    #[test]
    fn parse_subscribe() {
        let msg = ClientMessage::parse(r#"{"type":"subscribe","channels":["wallet","logs"]}"#)
            .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Subscribe {
                channels: serde_json::json!(["wallet", "logs"])
            }
        );
    }

    #[test]
    fn subscribe_without_channels_echoes_null() {
        let msg = ClientMessage::parse(r#"{"type":"subscribe"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Subscribe {
                channels: Value::Null
            }
        );
    }

    #[test]
    fn unknown_type_is_representable() {
        let msg = ClientMessage::parse(r#"{"type":"ping","x":1}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Unknown {
                kind: String::from("ping")
            }
        );
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(matches!(
            ClientMessage::parse("not json"),
            Err(ClientMessageError::Json(_))
        ));
        assert!(matches!(
            ClientMessage::parse("[1,2]"),
            Err(ClientMessageError::NotAnObject)
        ));
        assert!(matches!(
            ClientMessage::parse(r#"{"type":3}"#),
            Err(ClientMessageError::MissingType)
        ));
    }

    #[test]
    fn type_field_must_be_a_string() {
        for frame in [r#"{"channels":["logs"]}"#, r#"{"type":null}"#, r#"{"type":["subscribe"]}"#] {
            assert!(
                matches!(ClientMessage::parse(frame), Err(ClientMessageError::MissingType)),
                "{frame}"
            );
        }
    }
}
