//! The broadcast hub: single owner of all shared monitor state.
//!
//! [`BroadcastHub`] is built once at startup and shared as
//! `Arc<BroadcastHub>` between the HTTP handlers, the `WebSocket` tasks and
//! the scheduler. It owns the bounded event log, the snapshot generator,
//! the connection registry and the clock, so the whole broadcast path can
//! be exercised in tests without sockets or timers.
//!
//! # Tick
//!
//! [`BroadcastHub::tick`] is one firing of a channel:
//!
//! 1. If no connection is registered, return [`TickOutcome::Skipped`]
//!    without generating anything.
//! 2. Generate the channel's snapshot (for `logs`, synthesize a record and
//!    append it to the event log).
//! 3. Serialize the `{type, payload}` envelope once.
//! 4. Queue the identical frame on every open connection.
//!
//! A serialization failure is logged and reported as
//! [`TickOutcome::Failed`]; it never affects other channels.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use livemon_types::{
    Channel, ConnectedPayload, ConnectionId, LogDraft, LogRecord, NodeStatus, ServerMessage,
    Sovereignty, Wallet,
};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, error, info};

use crate::clock::{Clock, SystemClock};
use crate::event_log::{EventLog, LogPage};
use crate::registry::{ConnectionHandle, ConnectionRegistry};
use crate::snapshot::SnapshotGenerator;

/// Greeting text carried in every `connected` message.
pub const WELCOME_MESSAGE: &str = "Connected to live monitor";

/// Result of one [`BroadcastHub::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No connections were registered; nothing was generated.
    Skipped,
    /// The frame was queued on `recipients` connections.
    Delivered {
        /// Connections that accepted the frame.
        recipients: usize,
    },
    /// The snapshot could not be serialized.
    Failed,
}

/// Point-in-time counters exposed by `GET /api/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStats {
    /// Currently registered connections.
    pub connections: usize,
    /// Connections accepted since startup.
    pub connections_total: u64,
    /// Records currently buffered.
    pub logs_buffered: usize,
    /// Buffer capacity.
    pub log_capacity: usize,
    /// Records ever appended.
    pub logs_appended: u64,
    /// Frames broadcast per channel since startup.
    pub broadcasts: BTreeMap<Channel, u64>,
    /// Seconds since the hub was created.
    pub uptime_seconds: u64,
}

#[derive(Debug, Default)]
struct BroadcastCounters {
    sovereignty: AtomicU64,
    wallet: AtomicU64,
    nodes: AtomicU64,
    logs: AtomicU64,
    connections_total: AtomicU64,
}

impl BroadcastCounters {
    const fn for_channel(&self, channel: Channel) -> &AtomicU64 {
        match channel {
            Channel::Sovereignty => &self.sovereignty,
            Channel::Wallet => &self.wallet,
            Channel::Nodes => &self.nodes,
            Channel::Logs => &self.logs,
        }
    }

    fn record(&self, channel: Channel) {
        self.for_channel(channel).fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> BTreeMap<Channel, u64> {
        Channel::ALL
            .iter()
            .map(|c| (*c, self.for_channel(*c).load(Ordering::Relaxed)))
            .collect()
    }
}

/// Shared state behind the REST API, the `WebSocket` endpoint and the
/// broadcast scheduler.
pub struct BroadcastHub {
    log: RwLock<EventLog>,
    snapshots: Mutex<SnapshotGenerator>,
    registry: RwLock<ConnectionRegistry>,
    clock: Arc<dyn Clock>,
    started_at: i64,
    counters: BroadcastCounters,
}

impl BroadcastHub {
    /// Create a hub with the system clock and an OS-seeded generator.
    pub fn new(log_capacity: usize) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let generator = SnapshotGenerator::new(clock.now_millis());
        Self::with_parts(log_capacity, clock, generator)
    }

    /// Create a hub from explicit parts (injected clock and generator).
    pub fn with_parts(
        log_capacity: usize,
        clock: Arc<dyn Clock>,
        generator: SnapshotGenerator,
    ) -> Self {
        let started_at = clock.now_millis();
        Self {
            log: RwLock::new(EventLog::with_capacity(log_capacity)),
            snapshots: Mutex::new(generator),
            registry: RwLock::new(ConnectionRegistry::new()),
            clock,
            started_at,
            counters: BroadcastCounters::default(),
        }
    }

    /// Current time from the injected clock.
    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Seconds elapsed since the hub was created.
    pub fn uptime_seconds(&self) -> u64 {
        u64::try_from(self.now().saturating_sub(self.started_at) / 1000).unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------------

    /// Register a new connection.
    ///
    /// The `connected` greeting is queued before the connection joins the
    /// registry, so it is always the first frame the client receives.
    /// Returns the id and the receiver the socket task must drain.
    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<Arc<str>>) {
        let id = ConnectionId::new();
        let (handle, rx) = ConnectionHandle::channel();

        let greeting = ServerMessage::Connected(ConnectedPayload {
            client_id: id,
            timestamp: self.now(),
            message: WELCOME_MESSAGE.to_owned(),
        });
        match serde_json::to_string(&greeting) {
            Ok(json) => {
                handle.send(Arc::from(json));
            }
            Err(e) => error!(client_id = %id, error = %e, "Failed to serialize greeting"),
        }

        let mut registry = self.registry.write().await;
        registry.register(id, handle);
        self.counters.connections_total.fetch_add(1, Ordering::Relaxed);
        info!(client_id = %id, connections = registry.len(), "WebSocket client connected");

        (id, rx)
    }

    /// Remove a connection. Safe to call more than once.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let mut registry = self.registry.write().await;
        let removed = registry.unregister(id);
        if removed {
            info!(client_id = %id, connections = registry.len(), "WebSocket client disconnected");
        }
        removed
    }

    /// Queue a reply on one connection.
    pub async fn send_to(&self, id: ConnectionId, message: &ServerMessage) -> bool {
        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(e) => {
                error!(client_id = %id, error = %e, kind = message.kind(), "Failed to serialize reply");
                return false;
            }
        };
        self.registry.read().await.send_to(id, Arc::from(json))
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.registry.read().await.len()
    }

    // -----------------------------------------------------------------------
    // Broadcast
    // -----------------------------------------------------------------------

    /// Fire one channel: generate, serialize once, fan out.
    pub async fn tick(&self, channel: Channel) -> TickOutcome {
        if self.registry.read().await.is_empty() {
            debug!(%channel, "No connections, skipping tick");
            return TickOutcome::Skipped;
        }

        let now = self.now();
        let message = match channel {
            Channel::Sovereignty => {
                ServerMessage::SovereigntyUpdate(self.snapshots.lock().await.tick_sovereignty(now))
            }
            Channel::Wallet => {
                ServerMessage::WalletUpdate(self.snapshots.lock().await.tick_wallet(now))
            }
            Channel::Nodes => ServerMessage::NodeStatus(self.snapshots.lock().await.tick_nodes(now)),
            Channel::Logs => {
                let draft = self.snapshots.lock().await.synthesize_log(now);
                ServerMessage::LogEntry(self.log.write().await.append(draft))
            }
        };

        match self.broadcast(channel, &message).await {
            Ok(recipients) => {
                debug!(%channel, recipients, "Broadcast sent");
                TickOutcome::Delivered { recipients }
            }
            Err(e) => {
                error!(%channel, error = %e, "Failed to serialize broadcast");
                TickOutcome::Failed
            }
        }
    }

    /// Serialize `message` once and queue it on every open connection.
    ///
    /// Returns the number of connections that accepted the frame.
    pub async fn broadcast(
        &self,
        channel: Channel,
        message: &ServerMessage,
    ) -> Result<usize, serde_json::Error> {
        let frame: Arc<str> = Arc::from(serde_json::to_string(message)?);
        let recipients = self.registry.read().await.fan_out(&frame);
        self.counters.record(channel);
        Ok(recipients)
    }

    // -----------------------------------------------------------------------
    // Logs
    // -----------------------------------------------------------------------

    /// Append externally submitted entries and broadcast each one as a
    /// `log_entry` right away. Returns the stored records in order.
    pub async fn submit_logs(&self, drafts: Vec<LogDraft>) -> Vec<LogRecord> {
        let mut stored = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let record = self.log.write().await.append(draft);
            let message = ServerMessage::LogEntry(record.clone());
            if let Err(e) = self.broadcast(Channel::Logs, &message).await {
                error!(error = %e, id = record.id, "Failed to serialize submitted log entry");
            }
            stored.push(record);
        }
        info!(added = stored.len(), "Log entries submitted");
        stored
    }

    /// Page through buffered records, newest first.
    pub async fn query_logs(&self, limit: usize, offset: usize) -> LogPage {
        self.log.read().await.query(limit, offset)
    }

    // -----------------------------------------------------------------------
    // Snapshot reads
    // -----------------------------------------------------------------------

    /// Current sovereignty snapshot.
    pub async fn sovereignty(&self) -> Sovereignty {
        let now = self.now();
        self.snapshots.lock().await.current_sovereignty(now)
    }

    /// Current wallet snapshot.
    pub async fn wallet(&self) -> Wallet {
        let now = self.now();
        self.snapshots.lock().await.current_wallet(now)
    }

    /// Current node table.
    pub async fn nodes(&self) -> Vec<NodeStatus> {
        let now = self.now();
        self.snapshots.lock().await.current_nodes(now)
    }

    /// Counters for `GET /api/stats`.
    pub async fn stats(&self) -> HubStats {
        let connections = self.connection_count().await;
        let log = self.log.read().await;
        HubStats {
            connections,
            connections_total: self.counters.connections_total.load(Ordering::Relaxed),
            logs_buffered: log.len(),
            log_capacity: log.capacity(),
            logs_appended: log.total_appended(),
            broadcasts: self.counters.snapshot(),
            uptime_seconds: self.uptime_seconds(),
        }
    }
}

impl core::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}
