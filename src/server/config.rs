//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};

use crate::protocol::constants::{
    DEFAULT_MAX_LINE_LENGTH, DEFAULT_OUTBOUND_QUEUE_SIZE, DEFAULT_PORT,
};

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Addresses to listen on, one acceptor per address
    pub listen_addrs: Vec<SocketAddr>,

    /// Maximum concurrent connections (0 = unlimited)
    ///
    /// Connections over the limit are closed immediately, never queued.
    pub max_connections: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Lines queued per connection before further deliveries are dropped
    pub outbound_queue_size: usize,

    /// Longest accepted inbound line in bytes; longer lines close the connection
    pub max_line_length: usize,

    /// Relay the `quit` sentinel to other clients like any other line
    pub forward_sentinel: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addrs: vec![SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT))],
            max_connections: 0, // Unlimited
            tcp_nodelay: true,  // Chat lines are small and latency-sensitive
            outbound_queue_size: DEFAULT_OUTBOUND_QUEUE_SIZE,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            forward_sentinel: true,
        }
    }
}

impl ServerConfig {
    /// Create a new config listening on a single address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addrs: vec![addr],
            ..Default::default()
        }
    }

    /// Create a new config listening on each port on all interfaces
    pub fn with_ports(ports: &[u16]) -> Self {
        Self {
            listen_addrs: ports
                .iter()
                .map(|&port| SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
                .collect(),
            ..Default::default()
        }
    }

    /// Replace the listen addresses with a single address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.listen_addrs = vec![addr];
        self
    }

    /// Add another listen address
    pub fn listen_on(mut self, addr: SocketAddr) -> Self {
        self.listen_addrs.push(addr);
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }

    /// Set per-connection outbound queue size (at least 1)
    pub fn outbound_queue_size(mut self, size: usize) -> Self {
        self.outbound_queue_size = size.max(1);
        self
    }

    /// Set maximum inbound line length
    pub fn max_line_length(mut self, len: usize) -> Self {
        self.max_line_length = len;
        self
    }

    /// Choose whether the `quit` sentinel is relayed
    pub fn forward_sentinel(mut self, forward: bool) -> Self {
        self.forward_sentinel = forward;
        self
    }
}
