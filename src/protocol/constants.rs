//! Protocol constants

/// Port the server listens on when none is configured
pub const DEFAULT_PORT: u16 = 9000;

/// Line a client sends to announce it is leaving
pub const SENTINEL: &str = "quit";

/// Prefix placed before the sender id in relayed lines
pub const SENDER_PREFIX: &str = "Client ";

/// Separator between the sender id and the relayed text
pub const SENDER_SEPARATOR: &str = ": ";

/// Default maximum inbound line length in bytes (excluding terminator)
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8 * 1024;

/// Default number of lines queued per connection before deliveries are dropped
pub const DEFAULT_OUTBOUND_QUEUE_SIZE: usize = 256;
