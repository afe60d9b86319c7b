//! # Relay Module
//!
//! WebSocket front end: accepts client connections, routes each message to a
//! persona and streams the upstream reply back frame by frame.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial relay with per-connection state machine

pub mod connection;
pub mod context;
pub mod protocol;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::{Connection, ExchangeOutcome, RelayState, MAX_PENDING};
pub use context::RelayContext;
pub use server::RelayServer;
