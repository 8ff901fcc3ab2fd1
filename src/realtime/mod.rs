// Real-time connection registry
// Tracks live WebSocket connections and delivers transient events to them

//! # Connection Manager
//!
//! The transient half of the fan-out mechanism. Each connected client holds
//! a per-user WebSocket; the manager keeps an outbound channel per
//! connection and delivers [`LabEvent`]s to one user, a set of users, or
//! everyone.
//!
//! Delivery is best-effort and fire-and-forget: by the time an event is
//! pushed, the state transition that produced it has already been durably
//! persisted, so a failed push to a stale or closed connection is silently
//! dropped and the connection pruned. The durable notification record is the
//! source of truth; the push is a latency optimization for connected
//! clients.
//!
//! The manager is an injected, lifecycle-scoped service: constructed once at
//! process start and shared via `Arc`, never module-level mutable state.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::engine::events::LabEvent;

/// One live WebSocket connection
struct Connection {
    user_id: String,
    tx: mpsc::Sender<LabEvent>,
}

/// Registry of live connections, keyed by connection id
///
/// A user may hold several connections at once (multiple tabs/devices);
/// `send_to_user` delivers to all of them.
#[derive(Default)]
pub struct ConnectionManager {
    connections: DashMap<Uuid, Connection>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for a user; the returned id is the handle for
    /// `unregister` when the socket closes.
    pub fn register<U: Into<String>>(&self, user_id: U, tx: mpsc::Sender<LabEvent>) -> Uuid {
        let connection_id = Uuid::new_v4();
        let user_id = user_id.into();
        debug!("registering connection {} for user {}", connection_id, user_id);
        self.connections
            .insert(connection_id, Connection { user_id, tx });
        connection_id
    }

    pub fn unregister(&self, connection_id: &Uuid) {
        self.connections.remove(connection_id);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Deliver an event to every connection of one user.
    /// Returns the number of connections the event was handed to.
    pub fn send_to_user(&self, user_id: &str, event: &LabEvent) -> usize {
        self.deliver(|conn| conn.user_id == user_id, event)
    }

    /// Deliver an event to every connection of any of the given users
    pub fn send_to_users(&self, user_ids: &[String], event: &LabEvent) -> usize {
        self.deliver(|conn| user_ids.iter().any(|id| id == &conn.user_id), event)
    }

    /// Deliver an event to every live connection
    pub fn broadcast(&self, event: &LabEvent) -> usize {
        self.deliver(|_| true, event)
    }

    fn deliver<F: Fn(&Connection) -> bool>(&self, matches: F, event: &LabEvent) -> usize {
        let mut delivered = 0;
        let mut stale = Vec::new();

        for entry in self.connections.iter() {
            if !matches(entry.value()) {
                continue;
            }
            match entry.value().tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Slow consumer: drop this event, keep the connection
                    debug!(
                        "dropping event for slow connection {} (user {})",
                        entry.key(),
                        entry.value().user_id
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    stale.push(*entry.key());
                }
            }
        }

        for connection_id in stale {
            debug!("pruning stale connection {}", connection_id);
            self.connections.remove(&connection_id);
        }

        delivered
    }
}
