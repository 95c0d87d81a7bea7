//! Connection registry implementation
//!
//! The central registry that tracks every live connection and provides
//! consistent snapshots for fan-out.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};

use super::connection::{Connection, ConnectionId};

/// Central registry for all live connections
///
/// A single `RwLock` guards the map. Ids come from a counter that is never
/// reset, so an id is never handed out twice for the registry's lifetime.
pub struct ConnectionRegistry {
    /// Map of connection id to connection, ordered by id
    connections: RwLock<BTreeMap<ConnectionId, Arc<Connection>>>,

    next_id: AtomicU64,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new connection
    ///
    /// Allocates the next id and inserts the connection in one step.
    /// `outbound` is the queue drained by the connection's writer task.
    pub async fn add(&self, peer_addr: SocketAddr, outbound: mpsc::Sender<Bytes>) -> Arc<Connection> {
        let mut connections = self.connections.write().await;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let conn = Arc::new(Connection::new(id, peer_addr, outbound));
        connections.insert(id, Arc::clone(&conn));

        tracing::info!(
            conn_id = id,
            peer = %peer_addr,
            connections = connections.len(),
            "Connection registered"
        );

        conn
    }

    /// Remove a connection and mark it closed
    ///
    /// Idempotent: removing an unknown or already removed id does nothing.
    pub async fn remove(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        let removed = self.connections.write().await.remove(&id);

        if let Some(ref conn) = removed {
            conn.close();
            tracing::info!(
                conn_id = id,
                peer = %conn.peer_addr(),
                "Connection removed"
            );
        }

        removed
    }

    /// Point-in-time view of all live connections, in ascending id order
    ///
    /// Later adds and removes do not affect a snapshot already taken.
    pub async fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Check if a connection is registered
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&id)
    }

    /// Get the number of live connections
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Check if no connections are registered
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Remove and close every connection
    ///
    /// Returns the number of connections closed.
    pub async fn close_all(&self) -> usize {
        let connections = std::mem::take(&mut *self.connections.write().await);

        for conn in connections.values() {
            conn.close();
        }

        if !connections.is_empty() {
            tracing::info!(count = connections.len(), "Closed all connections");
        }

        connections.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
