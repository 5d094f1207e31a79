//! Record types for the log buffer and the simulated monitored domains.
//!
//! All structs serialize with camelCase keys because the dashboard is a
//! JavaScript client.

use serde::{Deserialize, Serialize};

use crate::enums::{LogLevel, NodeHealth};

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

/// One entry in the bounded event log.
///
/// Created on append with a freshly assigned `id`; never mutated after that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Monotonically increasing id assigned at append time.
    pub id: u64,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message (1..=1000 characters).
    pub message: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Node that emitted the entry.
    pub node_id: String,
    /// Session the entry belongs to.
    pub session_id: String,
    /// Free-form structured context.
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

/// A log entry that has not been appended yet and so has no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDraft {
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Node that emitted the entry.
    pub node_id: String,
    /// Session the entry belongs to.
    pub session_id: String,
    /// Free-form structured context.
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl LogDraft {
    /// Attach an id, producing the immutable record.
    pub fn into_record(self, id: u64) -> LogRecord {
        LogRecord {
            id,
            level: self.level,
            message: self.message,
            timestamp: self.timestamp,
            node_id: self.node_id,
            session_id: self.session_id,
            context: self.context,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot domains
// ---------------------------------------------------------------------------

/// Sovereignty metrics of the simulated network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sovereignty {
    /// Overall status label.
    pub status: String,
    /// Coherence ratio, kept in `[0.9, 1.0]`.
    pub coherence: f64,
    /// Consensus percentage, kept in `[99, 100]`.
    pub consensus_omnibus: f64,
    /// Number of active agents.
    pub active_agents: u32,
    /// Decisions per minute, kept in `[0, 500]`.
    pub decisions_per_minute: f64,
    /// Seconds since the monitor started.
    pub uptime_seconds: u64,
    /// Epoch milliseconds of the last read.
    pub timestamp: i64,
}

/// Wallet balance of the simulated treasury.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// Wallet address.
    pub address: String,
    /// Current balance, never negative.
    pub balance: f64,
    /// Currency code.
    pub currency: String,
    /// Transactions awaiting confirmation, kept in `[0, 50]`.
    pub pending_transactions: u32,
    /// Signed amount of the most recent balance change.
    pub last_transaction_amount: f64,
    /// Epoch milliseconds of the last read.
    pub timestamp: i64,
}

/// Health of one simulated node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    /// Stable node identifier.
    pub node_id: String,
    /// Display name.
    pub name: String,
    /// Deployment region.
    pub region: String,
    /// Derived health classification.
    pub health: NodeHealth,
    /// CPU utilisation, kept in `[0, 100]`.
    pub cpu_percent: f64,
    /// Memory utilisation, kept in `[0, 100]`.
    pub memory_percent: f64,
    /// Round-trip latency, kept in `[1, 2000]`.
    pub latency_ms: f64,
    /// Connected peers.
    pub peers: u32,
    /// Epoch milliseconds of the last heartbeat.
    pub last_heartbeat: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn log_record_uses_camel_case_keys() {
        let record = LogDraft {
            level: LogLevel::Info,
            message: String::from("hello"),
            timestamp: 42,
            node_id: String::from("node-1"),
            session_id: String::from("s-1"),
            context: serde_json::Map::new(),
        }
        .into_record(7);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["nodeId"], "node-1");
        assert_eq!(json["sessionId"], "s-1");
        assert_eq!(json["level"], "INFO");
        assert!(json.get("node_id").is_none());
    }

    #[test]
    fn sovereignty_exposes_consensus_omnibus() {
        let s = Sovereignty {
            status: String::from("sovereign"),
            coherence: 0.95,
            consensus_omnibus: 99.5,
            active_agents: 3,
            decisions_per_minute: 10.0,
            uptime_seconds: 1,
            timestamp: 0,
        };
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("consensusOmnibus").is_some());
        assert!(json.get("decisionsPerMinute").is_some());
    }
}
