//! Registry of open `WebSocket` connections.
//!
//! The registry does not own sockets. Each entry is a [`ConnectionHandle`]
//! wrapping the sending half of an unbounded queue; the socket task owns the
//! receiving half and drains it into the transport. A handle counts as open
//! while that receiver is alive, so a connection that has started closing is
//! skipped by [`ConnectionRegistry::for_each_open`] even before its task has
//! unregistered it.
//!
//! Queues are unbounded: a slow client's backlog grows without limit.

use std::collections::BTreeMap;
use std::sync::Arc;

use livemon_types::ConnectionId;
use tokio::sync::mpsc;

/// Sending side of one connection's outbound queue.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    tx: mpsc::UnboundedSender<Arc<str>>,
}

impl ConnectionHandle {
    /// Create a handle and the receiver the socket task will drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Arc<str>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Whether the receiving side is still alive.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue a serialized frame. Returns `false` if the connection has closed.
    pub fn send(&self, frame: Arc<str>) -> bool {
        self.tx.send(frame).is_ok()
    }
}

/// Set of currently registered connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: BTreeMap<ConnectionId, ConnectionHandle>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            connections: BTreeMap::new(),
        }
    }

    /// Add a connection. Returns `false` (and keeps the existing handle)
    /// if `id` is already registered.
    pub fn register(&mut self, id: ConnectionId, handle: ConnectionHandle) -> bool {
        if self.connections.contains_key(&id) {
            return false;
        }
        self.connections.insert(id, handle);
        true
    }

    /// Remove a connection. Removing an absent id is a no-op that returns
    /// `false`, so close and error paths may both call this.
    pub fn unregister(&mut self, id: ConnectionId) -> bool {
        self.connections.remove(&id).is_some()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Call `f` for every registered connection whose receiver is alive,
    /// in registry iteration order.
    pub fn for_each_open<F>(&self, mut f: F)
    where
        F: FnMut(ConnectionId, &ConnectionHandle),
    {
        for (id, handle) in &self.connections {
            if handle.is_open() {
                f(*id, handle);
            }
        }
    }

    /// Queue the same frame on every open connection.
    ///
    /// Returns how many connections accepted it. A connection that closes
    /// between the open check and the send is skipped silently.
    pub fn fan_out(&self, frame: &Arc<str>) -> usize {
        let mut delivered: usize = 0;
        self.for_each_open(|_, handle| {
            if handle.send(Arc::clone(frame)) {
                delivered = delivered.saturating_add(1);
            }
        });
        delivered
    }

    /// Queue a frame on a single connection.
    pub fn send_to(&self, id: ConnectionId, frame: Arc<str>) -> bool {
        self.connections
            .get(&id)
            .is_some_and(|handle| handle.send(frame))
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
