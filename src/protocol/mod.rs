//! Chat wire protocol
//!
//! Plain newline-delimited UTF-8 text over TCP. Clients send raw lines; the
//! server relays each line to every other client with a sender prefix:
//!
//! ```text
//! Client                         Server                        Others
//!   |---- "hello\n" ------------->|                               |
//!   |                             |---- "Client 1: hello\n" ----->|
//! ```
//!
//! The `Client <id>: ` prefix is the only structured part of the protocol.
//! `\r\n` is accepted as a line terminator on input; output always uses `\n`.

pub mod constants;
pub mod lines;
pub mod message;

pub use constants::*;
pub use lines::LineReader;
pub use message::{parse_broadcast_line, ChatMessage};
