//! Per-connection tasks
//!
//! Each accepted socket runs a read loop (this task) and a writer task:
//!
//! ```text
//!   socket read half ──► LineReader ──► Broadcaster::send ──► other queues
//!   outbound queue   ──► writer task ──► socket write half
//! ```
//!
//! Whichever side stops first (peer EOF, read error, write error, local
//! close) marks the connection closed; the other side sees that and stops.
//! The socket is released once both halves are dropped.

use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::protocol::{ChatMessage, LineReader};
use crate::registry::{Connection, ConnectionRegistry};

use super::broadcaster::Broadcaster;

/// Why a connection's read loop ended
#[derive(Debug)]
pub enum CloseReason {
    /// Peer closed its side of the socket
    PeerClosed,
    /// Read failed (including oversized lines and invalid UTF-8)
    ReadError(io::Error),
    /// Connection was closed locally (write failure, shutdown, removal)
    Closed,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::PeerClosed => write!(f, "peer closed"),
            CloseReason::ReadError(e) => write!(f, "read error: {}", e),
            CloseReason::Closed => write!(f, "closed locally"),
        }
    }
}

/// Read loop and teardown for one registered connection
pub struct ConnectionTask {
    conn: Arc<Connection>,
    broadcaster: Arc<Broadcaster>,
    max_line_length: usize,
    forward_sentinel: bool,
}

impl ConnectionTask {
    pub fn new(
        conn: Arc<Connection>,
        broadcaster: Arc<Broadcaster>,
        max_line_length: usize,
        forward_sentinel: bool,
    ) -> Self {
        Self {
            conn,
            broadcaster,
            max_line_length,
            forward_sentinel,
        }
    }

    /// Run the connection to completion
    ///
    /// Spawns the writer task, reads lines until the stream ends, then tears
    /// the connection down exactly once and waits for the writer to stop.
    pub async fn run<R, W>(self, reader: R, writer: W, outbound_rx: mpsc::Receiver<Bytes>) -> CloseReason
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let writer_handle = tokio::spawn(write_loop(
            Arc::clone(&self.conn),
            writer,
            outbound_rx,
            Arc::clone(self.broadcaster.registry()),
        ));

        let reason = self.read_loop(reader).await;
        self.teardown(&reason).await;

        if let Err(e) = writer_handle.await {
            tracing::debug!(conn_id = self.conn.id(), error = %e, "Writer task failed");
        }
        reason
    }

    async fn read_loop<R: AsyncRead + Unpin>(&self, reader: R) -> CloseReason {
        let mut lines = LineReader::new(reader, self.max_line_length);
        let id = self.conn.id();

        loop {
            let line = tokio::select! {
                _ = self.conn.closed() => return CloseReason::Closed,
                line = lines.next_line() => line,
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => return CloseReason::PeerClosed,
                Err(e) => return CloseReason::ReadError(e),
            };

            self.broadcaster.metrics().line_received();
            tracing::debug!(conn_id = id, line = %line, "Line received");

            let message = ChatMessage::new(id, line);
            if !self.forward_sentinel && message.is_sentinel() {
                tracing::debug!(conn_id = id, "Sentinel not forwarded");
                continue;
            }

            // Nothing goes out once teardown has started
            if self.conn.is_closed() {
                return CloseReason::Closed;
            }

            self.broadcaster.broadcast(&message).await;
        }
    }

    async fn teardown(&self, reason: &CloseReason) {
        // Counted before the writer is released, so peers never observe EOF first
        self.broadcaster.metrics().connection_closed();
        self.broadcaster.registry().remove(self.conn.id()).await;
        self.conn.close();

        match reason {
            CloseReason::ReadError(_) => tracing::warn!(
                conn_id = self.conn.id(),
                peer = %self.conn.peer_addr(),
                reason = %reason,
                "Client disconnected"
            ),
            _ => tracing::info!(
                conn_id = self.conn.id(),
                peer = %self.conn.peer_addr(),
                reason = %reason,
                "Client disconnected"
            ),
        }
    }
}

/// Drain the outbound queue into the socket until the connection closes
async fn write_loop<W>(
    conn: Arc<Connection>,
    mut writer: W,
    mut outbound_rx: mpsc::Receiver<Bytes>,
    registry: Arc<ConnectionRegistry>,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        let line = tokio::select! {
            biased;
            line = outbound_rx.recv() => match line {
                Some(line) => line,
                None => break,
            },
            _ = conn.closed() => break,
        };

        let result = tokio::select! {
            result = writer.write_all(&line) => result,
            _ = conn.closed() => break,
        };

        if let Err(e) = result {
            tracing::debug!(conn_id = conn.id(), error = %e, "Write failed");
            registry.remove(conn.id()).await;
            break;
        }
    }

    let _ = writer.shutdown().await;
}
