//! Enumeration types shared across the live monitor.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Log levels
// ---------------------------------------------------------------------------

/// Severity of a [`LogRecord`](crate::LogRecord).
///
/// Serialized in upper case (`"INFO"`, `"CRITICAL"`) to match what the
/// dashboard sends and expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Verbose diagnostic output.
    Debug,
    /// Normal operational message.
    Info,
    /// Something unexpected that did not fail.
    Warn,
    /// An operation failed.
    Error,
    /// A failure that needs immediate attention.
    Critical,
}

// ---------------------------------------------------------------------------
// Node health
// ---------------------------------------------------------------------------

/// Coarse health classification of a simulated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeHealth {
    /// Responding normally.
    Online,
    /// Responding, but with elevated latency or load.
    Degraded,
    /// Not responding.
    Offline,
}

// ---------------------------------------------------------------------------
// Broadcast channels
// ---------------------------------------------------------------------------

/// One named category of periodic broadcast.
///
/// Each channel runs on its own timer and produces one outbound message
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Sovereignty metrics.
    Sovereignty,
    /// Wallet balance.
    Wallet,
    /// Node health table.
    Nodes,
    /// Synthetic log entries.
    Logs,
}

impl Channel {
    /// All channels in a fixed order.
    pub const ALL: [Self; 4] = [Self::Sovereignty, Self::Wallet, Self::Nodes, Self::Logs];

    /// Channel name as used in configuration and `subscribe` frames.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sovereignty => "sovereignty",
            Self::Wallet => "wallet",
            Self::Nodes => "nodes",
            Self::Logs => "logs",
        }
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
