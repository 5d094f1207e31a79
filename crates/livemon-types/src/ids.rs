//! Connection identifiers.
//!
//! Connections are identified by random (v4) UUIDs. The identifier is
//! handed to the client in the `connected` greeting as `clientId` and
//! tags every log line about that connection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one open `WebSocket` connection.
///
/// Serializes as the bare UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Allocate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
