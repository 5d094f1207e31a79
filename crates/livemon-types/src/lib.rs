//! Shared type definitions for the live monitor backend.
//!
//! Every record that crosses a boundary (REST body, `WebSocket` frame,
//! broadcast payload) is defined here so the core and the API layer agree
//! on one shape.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for connection identifiers
//! - [`enums`] -- Log levels, node health, broadcast channels
//! - [`structs`] -- Log records and the simulated snapshot domains
//! - [`messages`] -- `WebSocket` envelopes in both directions

pub mod enums;
pub mod ids;
pub mod messages;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Channel, LogLevel, NodeHealth};
pub use ids::ConnectionId;
pub use messages::{
    ClientMessage, ClientMessageError, ConnectedPayload, ServerMessage, SubscribedPayload,
};
pub use structs::{LogDraft, LogRecord, NodeStatus, Sovereignty, Wallet};
