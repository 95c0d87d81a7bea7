//! Connection handle
//!
//! This module defines the per-connection state stored in the registry.

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};

use super::error::SendError;

/// Identifier assigned to each accepted connection, starting at 1
pub type ConnectionId = u64;

/// Handle to one accepted socket
///
/// A connection is either live or closed. Once [`close`](Self::close) has
/// been called, every further send fails with [`SendError::Closed`].
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,

    /// Remote peer address (informational)
    peer_addr: SocketAddr,

    /// Queue drained by this connection's writer task
    outbound: mpsc::Sender<Bytes>,

    /// Flips to `true` exactly once on teardown
    closed: watch::Sender<bool>,
}

impl Connection {
    pub(super) fn new(id: ConnectionId, peer_addr: SocketAddr, outbound: mpsc::Sender<Bytes>) -> Self {
        let (closed, _) = watch::channel(false);

        Self {
            id,
            peer_addr,
            outbound,
            closed,
        }
    }

    /// Get the connection id
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the remote peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Check if the connection has been closed
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Queue a line for delivery without waiting
    pub fn try_send(&self, line: Bytes) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed);
        }

        self.outbound.try_send(line).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// Mark the connection closed
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn close(&self) -> bool {
        self.closed.send_if_modified(|closed| {
            if *closed {
                false
            } else {
                *closed = true;
                true
            }
        })
    }

    /// Wait until the connection is closed
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives in `self`, so this only returns once closed
        let _ = rx.wait_for(|closed| *closed).await;
    }
}
