//! Snapshot generators for the simulated monitored domains.
//!
//! [`SnapshotGenerator`] owns the current sovereignty, wallet and node
//! records. A `tick_*` call applies a small bounded random walk to every
//! metric, clamps it back into its declared range, refreshes the timestamp
//! and returns a copy. A `current_*` call only refreshes the timestamp.
//!
//! # Ranges
//!
//! | Metric | Range |
//! |--------|-------|
//! | `coherence` | `[0.9, 1.0]` |
//! | `consensus_omnibus` | `[99, 100]` |
//! | `decisions_per_minute` | `[0, 500]` |
//! | `active_agents` | `[1, 64]` |
//! | wallet `balance` | `>= 0` |
//! | `pending_transactions` | `[0, 50]` |
//! | node `cpu_percent`, `memory_percent` | `[0, 100]` |
//! | node `latency_ms` | `[1, 2000]` |
//! | node `peers` | `[0, 64]` |

use livemon_types::{LogDraft, LogLevel, NodeHealth, NodeStatus, Sovereignty, Wallet};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// Inclusive bounds for sovereignty coherence.
pub const COHERENCE_RANGE: (f64, f64) = (0.9, 1.0);
/// Inclusive bounds for sovereignty consensus.
pub const CONSENSUS_RANGE: (f64, f64) = (99.0, 100.0);
/// Inclusive bounds for decisions per minute.
pub const DECISIONS_RANGE: (f64, f64) = (0.0, 500.0);
/// Inclusive bounds for node CPU and memory utilisation.
pub const PERCENT_RANGE: (f64, f64) = (0.0, 100.0);
/// Inclusive bounds for node latency.
pub const LATENCY_RANGE: (f64, f64) = (1.0, 2000.0);

const MAX_ACTIVE_AGENTS: u32 = 64;
const MAX_PENDING_TRANSACTIONS: u32 = 50;
const MAX_PEERS: u32 = 64;

/// Probability per nodes tick that an online node drops out.
const NODE_FAILURE_CHANCE: f64 = 0.02;
/// Probability per nodes tick that an offline node comes back.
const NODE_RECOVERY_CHANCE: f64 = 0.3;

const WALLET_ADDRESS: &str = "0x7f3a9c2e4b1d8f6a5c0e9b2d4f7a1c3e5b8d0f2a";

/// `(node_id, name, region)` of the simulated fleet.
const NODES: [(&str, &str, &str); 5] = [
    ("node-alpha", "Alpha", "us-east"),
    ("node-beta", "Beta", "eu-west"),
    ("node-gamma", "Gamma", "ap-southeast"),
    ("node-delta", "Delta", "us-west"),
    ("node-epsilon", "Epsilon", "eu-central"),
];

/// Holds and mutates the simulated domain state.
#[derive(Debug, Clone)]
pub struct SnapshotGenerator {
    rng: StdRng,
    started_at: i64,
    session_id: String,
    sovereignty: Sovereignty,
    wallet: Wallet,
    nodes: Vec<NodeStatus>,
}

impl SnapshotGenerator {
    /// Create a generator seeded from the operating system.
    pub fn new(now: i64) -> Self {
        Self::with_rng(StdRng::from_os_rng(), now)
    }

    /// Create a generator with a fixed seed (for reproducible tests).
    pub fn seeded(seed: u64, now: i64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), now)
    }

    fn with_rng(rng: StdRng, now: i64) -> Self {
        let session_id = format!("monitor-{}", uuid::Uuid::new_v4().simple());

        let sovereignty = Sovereignty {
            status: String::from("sovereign"),
            coherence: 0.97,
            consensus_omnibus: 99.7,
            active_agents: 12,
            decisions_per_minute: 120.0,
            uptime_seconds: 0,
            timestamp: now,
        };

        let wallet = Wallet {
            address: WALLET_ADDRESS.to_owned(),
            balance: 125_000.0,
            currency: String::from("SOV"),
            pending_transactions: 3,
            last_transaction_amount: 0.0,
            timestamp: now,
        };

        let nodes = NODES
            .iter()
            .map(|(node_id, name, region)| NodeStatus {
                node_id: (*node_id).to_owned(),
                name: (*name).to_owned(),
                region: (*region).to_owned(),
                health: NodeHealth::Online,
                cpu_percent: 35.0,
                memory_percent: 48.0,
                latency_ms: 40.0,
                peers: 8,
                last_heartbeat: now,
            })
            .collect();

        Self {
            rng,
            started_at: now,
            session_id,
            sovereignty,
            wallet,
            nodes,
        }
    }

    // -----------------------------------------------------------------------
    // Sovereignty
    // -----------------------------------------------------------------------

    /// Advance the sovereignty random walk and return the new value.
    pub fn tick_sovereignty(&mut self, now: i64) -> Sovereignty {
        let coherence_delta = self.rng.random_range(-0.01..=0.01);
        let consensus_delta = self.rng.random_range(-0.2..=0.2);
        let decisions_delta = self.rng.random_range(-20.0..=20.0);
        let agents_delta = self.rng.random_range(-2..=2);

        let s = &mut self.sovereignty;
        s.coherence = walk(s.coherence, coherence_delta, COHERENCE_RANGE, 4);
        s.consensus_omnibus = walk(s.consensus_omnibus, consensus_delta, CONSENSUS_RANGE, 3);
        s.decisions_per_minute = walk(s.decisions_per_minute, decisions_delta, DECISIONS_RANGE, 1);
        s.active_agents = s
            .active_agents
            .saturating_add_signed(agents_delta)
            .clamp(1, MAX_ACTIVE_AGENTS);

        self.current_sovereignty(now)
    }

    /// Return the sovereignty record with a refreshed timestamp.
    pub fn current_sovereignty(&mut self, now: i64) -> Sovereignty {
        self.sovereignty.timestamp = now;
        self.sovereignty.uptime_seconds = self.uptime_seconds(now);
        self.sovereignty.clone()
    }

    // -----------------------------------------------------------------------
    // Wallet
    // -----------------------------------------------------------------------

    /// Apply a random balance change and return the new wallet.
    pub fn tick_wallet(&mut self, now: i64) -> Wallet {
        let change: f64 = round_to(self.rng.random_range(-250.0..=500.0), 2);
        let pending_delta = self.rng.random_range(-2..=2);

        let w = &mut self.wallet;
        let previous = w.balance;
        w.balance = round_to((previous + change).max(0.0), 2);
        w.last_transaction_amount = round_to(w.balance - previous, 2);
        w.pending_transactions = w
            .pending_transactions
            .saturating_add_signed(pending_delta)
            .min(MAX_PENDING_TRANSACTIONS);

        self.current_wallet(now)
    }

    /// Return the wallet with a refreshed timestamp.
    pub fn current_wallet(&mut self, now: i64) -> Wallet {
        self.wallet.timestamp = now;
        self.wallet.clone()
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    /// Advance every node's metrics and availability and return the table.
    pub fn tick_nodes(&mut self, now: i64) -> Vec<NodeStatus> {
        for node in &mut self.nodes {
            let offline = node.health == NodeHealth::Offline;
            let flip = if offline {
                self.rng.random_bool(NODE_RECOVERY_CHANCE)
            } else {
                self.rng.random_bool(NODE_FAILURE_CHANCE)
            };
            let offline = offline != flip;

            if offline {
                node.health = NodeHealth::Offline;
                node.peers = 0;
                continue;
            }

            let cpu_delta = self.rng.random_range(-8.0..=8.0);
            let memory_delta = self.rng.random_range(-5.0..=5.0);
            let latency_factor: f64 = self.rng.random_range(0.85..=1.15);
            let peers_delta = self.rng.random_range(-1..=1);

            node.cpu_percent = walk(node.cpu_percent, cpu_delta, PERCENT_RANGE, 1);
            node.memory_percent = walk(node.memory_percent, memory_delta, PERCENT_RANGE, 1);
            node.latency_ms = walk(
                node.latency_ms * latency_factor,
                0.0,
                LATENCY_RANGE,
                1,
            );
            node.peers = node.peers.saturating_add_signed(peers_delta).clamp(1, MAX_PEERS);
            node.health = classify(node);
        }

        self.current_nodes(now)
    }

    /// Return the node table with refreshed heartbeats.
    ///
    /// Offline nodes keep the heartbeat they had when they went down.
    pub fn current_nodes(&mut self, now: i64) -> Vec<NodeStatus> {
        for node in &mut self.nodes {
            if node.health != NodeHealth::Offline {
                node.last_heartbeat = now;
            }
        }
        self.nodes.clone()
    }

    // -----------------------------------------------------------------------
    // Logs
    // -----------------------------------------------------------------------

    /// Produce one synthetic log entry for the logs channel.
    pub fn synthesize_log(&mut self, now: i64) -> LogDraft {
        let level = self.random_level();
        let message = messages_for(level)
            .choose(&mut self.rng)
            .map_or_else(|| String::from("Heartbeat"), |m| (*m).to_owned());

        let node_id = self
            .nodes
            .choose(&mut self.rng)
            .map_or_else(|| String::from("node-alpha"), |n| n.node_id.clone());

        let mut context = serde_json::Map::new();
        context.insert(
            String::from("source"),
            serde_json::Value::String(String::from("simulator")),
        );

        LogDraft {
            level,
            message,
            timestamp: now,
            node_id,
            session_id: self.session_id.clone(),
            context,
        }
    }

    /// Weighted pick: DEBUG 15%, INFO 55%, WARN 20%, ERROR 8%, CRITICAL 2%.
    fn random_level(&mut self) -> LogLevel {
        let roll: u32 = self.rng.random_range(0..100);
        match roll {
            0..15 => LogLevel::Debug,
            15..70 => LogLevel::Info,
            70..90 => LogLevel::Warn,
            90..98 => LogLevel::Error,
            _ => LogLevel::Critical,
        }
    }

    fn uptime_seconds(&self, now: i64) -> u64 {
        u64::try_from(now.saturating_sub(self.started_at) / 1000).unwrap_or(0)
    }

    /// Session id stamped on synthetic log entries.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

const fn messages_for(level: LogLevel) -> &'static [&'static str] {
    match level {
        LogLevel::Debug => &["Gossip round completed", "Peer table refreshed", "Cache warmed"],
        LogLevel::Info => &[
            "Consensus round finalized",
            "Heartbeat acknowledged by quorum",
            "Wallet ledger reconciled",
        ],
        LogLevel::Warn => &[
            "Peer latency above threshold",
            "Coherence drift detected",
            "Retrying block propagation",
        ],
        LogLevel::Error => &[
            "Peer connection reset",
            "Vote signature rejected",
            "Snapshot write failed",
        ],
        LogLevel::Critical => &[
            "Quorum lost on shard",
            "Node unreachable",
            "Ledger divergence detected",
        ],
    }
}

/// Health from load: high CPU or latency means degraded.
const fn classify(node: &NodeStatus) -> NodeHealth {
    if node.cpu_percent > 85.0 || node.latency_ms > 500.0 {
        NodeHealth::Degraded
    } else {
        NodeHealth::Online
    }
}

/// Add `delta`, round to `places` decimals, and clamp into `range`.
fn walk(value: f64, delta: f64, range: (f64, f64), places: i32) -> f64 {
    round_to(value + delta, places).clamp(range.0, range.1)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within(value: f64, range: (f64, f64)) -> bool {
        value >= range.0 && value <= range.1
    }

    #[test]
    fn sovereignty_stays_in_range_over_many_ticks() {
        let mut generator = SnapshotGenerator::seeded(7, 0);
        for step in 0..5_000 {
            let s = generator.tick_sovereignty(step);
            assert!(within(s.coherence, COHERENCE_RANGE), "{}", s.coherence);
            assert!(
                within(s.consensus_omnibus, CONSENSUS_RANGE),
                "{}",
                s.consensus_omnibus
            );
            assert!(within(s.decisions_per_minute, DECISIONS_RANGE));
            assert!((1..=MAX_ACTIVE_AGENTS).contains(&s.active_agents));
        }
    }

    #[test]
    fn wallet_balance_never_negative() {
        let mut generator = SnapshotGenerator::seeded(11, 0);
        generator.wallet.balance = 10.0;
        for step in 0..2_000 {
            let w = generator.tick_wallet(step);
            assert!(w.balance >= 0.0);
            assert!(w.pending_transactions <= MAX_PENDING_TRANSACTIONS);
        }
    }

    #[test]
    fn nodes_stay_in_range_and_keep_identity() {
        let mut generator = SnapshotGenerator::seeded(3, 0);
        for step in 0..2_000 {
            let nodes = generator.tick_nodes(step);
            assert_eq!(nodes.len(), NODES.len());
            for node in &nodes {
                assert!(within(node.cpu_percent, PERCENT_RANGE));
                assert!(within(node.memory_percent, PERCENT_RANGE));
                assert!(within(node.latency_ms, LATENCY_RANGE));
                assert!(node.peers <= MAX_PEERS);
                if node.health == NodeHealth::Offline {
                    assert_eq!(node.peers, 0);
                }
            }
        }
        let first = generator.current_nodes(2_000).into_iter().next().map(|n| n.node_id);
        assert_eq!(first.as_deref(), Some("node-alpha"));
    }

    #[test]
    fn current_refreshes_timestamp_without_walking() {
        let mut generator = SnapshotGenerator::seeded(1, 1_000);
        let before = generator.current_sovereignty(1_000);
        let after = generator.current_sovereignty(6_000);
        assert_eq!(after.timestamp, 6_000);
        assert_eq!(after.uptime_seconds, 5);
        assert!((before.coherence - after.coherence).abs() < f64::EPSILON);

        let wallet = generator.current_wallet(9_000);
        assert_eq!(wallet.timestamp, 9_000);
    }

    #[test]
    fn current_nodes_stamps_heartbeat_of_live_nodes() {
        let mut generator = SnapshotGenerator::seeded(1, 0);
        if let Some(node) = generator.nodes.last_mut() {
            node.health = NodeHealth::Offline;
            node.last_heartbeat = 500;
        }
        let nodes = generator.current_nodes(8_000);
        let (offline, live): (Vec<_>, Vec<_>) = nodes
            .iter()
            .partition(|n| n.health == NodeHealth::Offline);
        assert_eq!(offline.len(), 1);
        assert!(offline.iter().all(|n| n.last_heartbeat == 500));
        assert!(!live.is_empty());
        assert!(live.iter().all(|n| n.last_heartbeat == 8_000));

        let again = generator.current_nodes(9_000);
        assert!(
            again
                .iter()
                .filter(|n| n.health != NodeHealth::Offline)
                .all(|n| n.last_heartbeat == 9_000)
        );
    }

    #[test]
    fn same_seed_same_walk() {
        let mut a = SnapshotGenerator::seeded(42, 0);
        let mut b = SnapshotGenerator::seeded(42, 0);
        for step in 0..20 {
            let sa = a.tick_sovereignty(step);
            let sb = b.tick_sovereignty(step);
            assert!((sa.coherence - sb.coherence).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn synthetic_logs_are_well_formed() {
        let mut generator = SnapshotGenerator::seeded(5, 0);
        for step in 0..200 {
            let draft = generator.synthesize_log(step);
            assert!(!draft.message.is_empty());
            assert!(draft.message.chars().count() <= 1000);
            assert_eq!(draft.timestamp, step);
            assert!(NODES.iter().any(|(id, _, _)| *id == draft.node_id));
            assert_eq!(draft.session_id, generator.session_id());
        }
    }

    #[test]
    fn walk_clamps_both_ends() {
        assert!((walk(0.95, 1.0, COHERENCE_RANGE, 4) - 1.0).abs() < f64::EPSILON);
        assert!((walk(99.1, -5.0, CONSENSUS_RANGE, 3) - 99.0).abs() < f64::EPSILON);
    }
}
