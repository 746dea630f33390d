//! IPC message types for host ↔ overlay communication

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::snapshot::RawHostState;

/// Messages sent from the game host to the overlay
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum HostMessage {
    /// Player logged in; starts a fresh session
    SessionStarted,

    /// Player logged out
    SessionEnded,

    /// One game tick worth of raw player state
    Tick(RawHostState),

    /// A single config key changed in the host's settings store
    ConfigChanged { key: String, value: String },

    /// Display arrangement changed (or first report on connect)
    ScreensChanged { screens: Vec<Rect>, primary: usize },

    /// Health check
    Ping,

    /// Request graceful shutdown
    Shutdown,
}

/// Messages sent from the overlay back to the host
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum OverlayMessage {
    /// Health check response
    Pong,

    /// A command toggle was handled; the host should store it as false
    ToggleConsumed { key: String },

    /// Overlay body was clicked; focus the game window
    FocusHostRequested,

    /// Error occurred
    Error(String),
}
