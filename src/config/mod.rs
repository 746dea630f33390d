//! Configuration management for afk-overlay
//!
//! - **overlay**: user settings (rows, buttons, opacity, highlight rules)
//!   stored as flat TOML and updated key by key from host notifications

pub mod overlay;

// Re-export commonly used types
pub use overlay::{keys, ConfigEffect, OverlayConfig};
