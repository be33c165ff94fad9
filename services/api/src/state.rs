//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the dialog tracker
//! and the loaded configuration.

use crate::config::Config;
use std::sync::Arc;
use techbot_core::tracker::DialogTracker;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Conversation state for every channel served by this process.
    pub tracker: Arc<DialogTracker>,
    pub config: Arc<Config>,
}
