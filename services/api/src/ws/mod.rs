//! WebSocket chat channel
//!
//! A minimal live channel for the bot, useful for driving the menu from a
//! browser or a terminal client:
//!
//! - `protocol`: the JSON message format exchanged with the client.
//! - `session`: the connection lifecycle and the socket-backed transport.

pub mod protocol;
pub mod session;

pub use session::ws_handler;
