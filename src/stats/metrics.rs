//! Statistics and metrics for the chat server

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live server counters, updated from many tasks
#[derive(Debug)]
pub struct ServerMetrics {
    started_at: Instant,
    connections_accepted: AtomicU64,
    connections_rejected: AtomicU64,
    connections_closed: AtomicU64,
    lines_received: AtomicU64,
    deliveries: AtomicU64,
    dropped_deliveries: AtomicU64,
    failed_deliveries: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            connections_accepted: AtomicU64::new(0),
            connections_rejected: AtomicU64::new(0),
            connections_closed: AtomicU64::new(0),
            lines_received: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            dropped_deliveries: AtomicU64::new(0),
            failed_deliveries: AtomicU64::new(0),
        }
    }

    pub fn connection_accepted(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn line_received(&self) {
        self.lines_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one broadcast
    pub fn record_broadcast(&self, delivered: usize, dropped: usize, failed: usize) {
        self.deliveries.fetch_add(delivered as u64, Ordering::Relaxed);
        self.dropped_deliveries
            .fetch_add(dropped as u64, Ordering::Relaxed);
        self.failed_deliveries.fetch_add(failed as u64, Ordering::Relaxed);
    }

    /// Take a consistent-enough copy of the counters
    pub fn snapshot(&self) -> ServerStats {
        let accepted = self.connections_accepted.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);

        ServerStats {
            connections_accepted: accepted,
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
            connections_closed: closed,
            active_connections: accepted.saturating_sub(closed),
            lines_received: self.lines_received.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            dropped_deliveries: self.dropped_deliveries.load(Ordering::Relaxed),
            failed_deliveries: self.failed_deliveries.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Server-wide statistics
#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    /// Total connections ever accepted
    pub connections_accepted: u64,
    /// Connections turned away because of the connection cap
    pub connections_rejected: u64,
    /// Connections torn down
    pub connections_closed: u64,
    /// Current active connections
    pub active_connections: u64,
    /// Lines read from clients
    pub lines_received: u64,
    /// Lines queued to recipients
    pub deliveries: u64,
    /// Deliveries skipped because the recipient's queue was full
    pub dropped_deliveries: u64,
    /// Deliveries that failed because the recipient was gone
    pub failed_deliveries: u64,
    /// Uptime
    pub uptime: Duration,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }
}
