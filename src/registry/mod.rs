//! Connection registry
//!
//! The registry is the only shared mutable state in the server. It maps
//! connection ids to live [`Connection`] handles and hands out point-in-time
//! snapshots for broadcasting.
//!
//! # Architecture
//!
//! ```text
//!                      Arc<ConnectionRegistry>
//!                   ┌──────────────────────────┐
//!                   │ connections: BTreeMap<   │
//!                   │   id, Arc<Connection {   │
//!                   │     outbound: mpsc::Tx,  │
//!                   │     closed: watch::Tx,   │
//!                   │   }>                     │
//!                   │ >                        │
//!                   └────────────┬─────────────┘
//!                                │ snapshot()
//!         ┌──────────────────────┼──────────────────────┐
//!         ▼                      ▼                      ▼
//!   [conn 1 writer]        [conn 2 writer]        [conn 3 writer]
//!   outbound_rx.recv()     outbound_rx.recv()     outbound_rx.recv()
//!         │                      │                      │
//!         └─────────► write_all() to each socket ◄──────┘
//! ```
//!
//! Each connection's outbound path is a bounded queue drained by its own
//! writer task, so a broadcast never blocks on a slow socket. Encoded lines
//! are `bytes::Bytes`, so all recipients share one allocation.

pub mod connection;
pub mod error;
pub mod store;

pub use connection::{Connection, ConnectionId};
pub use error::SendError;
pub use store::ConnectionRegistry;
