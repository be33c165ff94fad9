//! Tech Resources Bot API Library Crate
//!
//! This library contains the host side of the menu bot: configuration, the
//! application state, API handlers, the WebSocket chat channel, and routing.
//! The `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod ws;
