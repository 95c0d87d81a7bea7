//! Chat client
//!
//! A [`ChatSession`] connects to a relay server and runs two paths at once:
//! - receive: every line from the server goes to a display sink
//! - send: every input line goes to the server; the sentinel (`quit`) is
//!   sent and then the outbound half is closed

pub mod config;
pub mod session;

pub use config::ClientConfig;
pub use session::{ChatSession, SessionSummary};
