//! Broadcast fan-out
//!
//! Delivers one sender's line to every other live connection.

use std::sync::Arc;

use crate::protocol::ChatMessage;
use crate::registry::{ConnectionId, ConnectionRegistry, SendError};
use crate::stats::ServerMetrics;

/// Outcome of a single broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients the line was queued for
    pub delivered: Vec<ConnectionId>,
    /// Recipients that missed the line because their queue was full
    pub dropped: Vec<ConnectionId>,
    /// Recipients that were gone; these have been removed from the registry
    pub failed: Vec<ConnectionId>,
}

impl BroadcastReport {
    /// Total number of recipients attempted
    pub fn recipients(&self) -> usize {
        self.delivered.len() + self.dropped.len() + self.failed.len()
    }
}

/// Fans out chat lines over a [`ConnectionRegistry`]
///
/// Writes never wait: each recipient has its own bounded queue, so a slow
/// or dead recipient cannot hold up the sender or the other recipients.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<ServerMetrics>,
}

impl Broadcaster {
    /// Create a broadcaster with its own metrics
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self::with_metrics(registry, Arc::new(ServerMetrics::new()))
    }

    /// Create a broadcaster that records into shared metrics
    pub fn with_metrics(registry: Arc<ConnectionRegistry>, metrics: Arc<ServerMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Get the registry this broadcaster delivers over
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get the metrics this broadcaster records into
    pub fn metrics(&self) -> &Arc<ServerMetrics> {
        &self.metrics
    }

    /// Send `text` from `sender` to every other live connection
    pub async fn send(&self, sender: ConnectionId, text: &str) -> BroadcastReport {
        self.broadcast(&ChatMessage::new(sender, text)).await
    }

    /// Broadcast a message to every live connection except its sender
    ///
    /// Recipients are visited in ascending id order. A failed recipient does
    /// not stop delivery to the rest; it is removed once the pass is done.
    pub async fn broadcast(&self, message: &ChatMessage) -> BroadcastReport {
        let line = message.encode();
        let targets = self.registry.snapshot().await;
        let mut report = BroadcastReport::default();

        for conn in targets.iter().filter(|c| c.id() != message.sender) {
            match conn.try_send(line.clone()) {
                Ok(()) => report.delivered.push(conn.id()),
                Err(SendError::Full) => {
                    tracing::warn!(
                        conn_id = conn.id(),
                        sender = message.sender,
                        "Recipient queue full, line dropped"
                    );
                    report.dropped.push(conn.id());
                }
                Err(SendError::Closed) => {
                    tracing::debug!(
                        conn_id = conn.id(),
                        sender = message.sender,
                        "Recipient closed during broadcast"
                    );
                    report.failed.push(conn.id());
                }
            }
        }

        for &id in &report.failed {
            self.registry.remove(id).await;
        }

        self.metrics.record_broadcast(
            report.delivered.len(),
            report.dropped.len(),
            report.failed.len(),
        );

        report
    }
}
