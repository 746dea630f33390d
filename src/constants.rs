//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Host game client constants
pub mod host {
    /// Number of slots in the character's inventory
    pub const INVENTORY_CAPACITY: u32 = 28;

    /// Item id the host reports for an empty inventory slot
    pub const EMPTY_SLOT_ID: i32 = -1;

    /// Animation id the host reports when no animation is playing
    pub const IDLE_ANIMATION_ID: i32 = -1;
}

/// Foreground tier boundaries (percent, inclusive)
pub mod tiers {
    /// At or below this percentage a row is drawn in the danger color
    pub const DANGER_PERCENT: u32 = 10;

    /// At or below this percentage a row is drawn in the warning color
    pub const WARNING_PERCENT: u32 = 50;
}

/// Adaptive layout metrics (logical pixels)
pub mod layout {
    pub const TITLE_BAR_HEIGHT: u32 = 20;
    pub const BASE_ROW_HEIGHT: u32 = 20;
    pub const ROW_SPACING: u32 = 8;
    pub const PADDING: u32 = 12;

    /// Extra height tolerated above the minimum before scaling kicks in
    pub const SCALING_BUFFER: u32 = 10;

    /// Scale increase per 100px of extra height
    pub const SCALING_STEP: f32 = 0.25;
    pub const MAX_SCALING: f32 = 2.0;

    pub const MIN_ICON_SIZE: f32 = 16.0;
    pub const MAX_ICON_SIZE: f32 = 28.0;
    pub const MIN_FONT_SIZE: f32 = 13.0;
    pub const MAX_FONT_SIZE: f32 = 22.0;
}

/// Window geometry bounds and defaults
pub mod geometry {
    pub const MIN_WIDTH: i32 = 50;
    pub const MIN_HEIGHT: i32 = 80;
    pub const MAX_WIDTH: i32 = 400;
    pub const MAX_HEIGHT: i32 = 250;

    pub const DEFAULT_X: i32 = 100;
    pub const DEFAULT_Y: i32 = 100;
    pub const DEFAULT_WIDTH: i32 = 300;
    pub const DEFAULT_HEIGHT: i32 = 180;
}

/// Keys of the persisted window geometry
pub mod persisted {
    /// Namespace all geometry keys live under
    pub const NAMESPACE: &str = "afkoverlay";

    pub const WINDOW_X: &str = "window_x";
    pub const WINDOW_Y: &str = "window_y";
    pub const WINDOW_WIDTH: &str = "window_width";
    pub const WINDOW_HEIGHT: &str = "window_height";
}

/// Config defaults
pub mod defaults {
    /// Background alpha (0 = fully transparent, 255 = fully opaque)
    pub const OPACITY: u8 = 200;

    /// Time without activity before the character counts as idle
    pub const IDLE_THRESHOLD_MS: u64 = 3000;
}

/// Filesystem paths and names
pub mod paths {
    /// Directory under the user's config/runtime dirs
    pub const APP_DIR: &str = "afk-overlay";

    pub const CONFIG_FILENAME: &str = "config.toml";
    pub const STATE_FILENAME: &str = "state.toml";
    pub const SOCKET_FILENAME: &str = "overlay.sock";
}

/// IPC framing
pub mod ipc {
    /// Maximum message size (10 MB) to prevent DoS via memory exhaustion
    pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;
}
