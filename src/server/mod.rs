//! Chat relay server
//!
//! ```text
//! TcpListener (per port) ──accept──► ConnectionRegistry::add
//!                                         │
//!                                         ▼
//!                              ConnectionTask (read loop) ──► Broadcaster::send
//!                              writer task ◄── outbound queue ◄──┘ (other connections)
//! ```

pub mod broadcaster;
pub mod config;
pub mod connection;
pub mod listener;

pub use broadcaster::{BroadcastReport, Broadcaster};
pub use config::ServerConfig;
pub use connection::{CloseReason, ConnectionTask};
pub use listener::{ChatServer, ServerHandle};
