//! Registry error types
//!
//! Error types for per-connection delivery.

/// Error returned when a line cannot be queued on a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// Connection is closed or its writer has stopped
    Closed,
    /// Outbound queue is full (slow recipient)
    Full,
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::Closed => write!(f, "Connection closed"),
            SendError::Full => write!(f, "Outbound queue full"),
        }
    }
}

impl std::error::Error for SendError {}
