//! Line-oriented TCP chat relay
//!
//! A server accepts TCP connections on one or more ports, gives each a
//! numeric id and relays every line a client sends to all other connected
//! clients, prefixed with the sender's id:
//!
//! ```text
//! client 1 ──"hello\n"──► server ──"Client 1: hello\n"──► client 2, 3, ...
//! ```
//!
//! The client side ([`client::ChatSession`]) reads broadcast lines into a
//! display sink and forwards input lines until the `quit` sentinel.
//!
//! # Example
//! ```no_run
//! use chat_relay::{ChatServer, ServerConfig};
//!
//! # async fn example() -> chat_relay::error::Result<()> {
//! let server = ChatServer::new(ServerConfig::default());
//! server.run().await
//! # }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod stats;

pub use client::{ChatSession, ClientConfig};
pub use error::{Error, Result};
pub use registry::{Connection, ConnectionId, ConnectionRegistry};
pub use server::{Broadcaster, ChatServer, ServerConfig, ServerHandle};
