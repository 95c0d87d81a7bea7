//! Client configuration

use crate::protocol::constants::{DEFAULT_MAX_LINE_LENGTH, DEFAULT_PORT, SENTINEL};

/// Client configuration options
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address as `host:port`
    pub server_addr: String,

    /// Input line that ends the session after being sent
    pub sentinel: String,

    /// Enable TCP_NODELAY
    pub tcp_nodelay: bool,

    /// Longest accepted line from the server
    pub max_line_length: usize,

    /// Longest input line the client will send
    ///
    /// Matches the server's default inbound limit; longer input ends the
    /// session with an error instead of being sent and rejected.
    pub max_outbound_line_length: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(format!("localhost:{}", DEFAULT_PORT))
    }
}

impl ClientConfig {
    /// Create a config for the given server address
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            sentinel: SENTINEL.to_string(),
            tcp_nodelay: true,
            // Relayed lines carry a "Client <id>: " prefix on top of the payload
            max_line_length: DEFAULT_MAX_LINE_LENGTH + 64,
            max_outbound_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Set the sentinel line
    pub fn sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }

    /// Set maximum line length accepted from the server
    pub fn max_line_length(mut self, len: usize) -> Self {
        self.max_line_length = len;
        self
    }

    /// Set maximum input line length sent to the server
    pub fn max_outbound_line_length(mut self, len: usize) -> Self {
        self.max_outbound_line_length = len;
        self
    }
}
