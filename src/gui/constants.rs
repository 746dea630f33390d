//! GUI-specific constants for window chrome and gesture handling

/// Window title and eframe app id
pub const APP_NAME: &str = "AFK Overlay";

/// Chrome
pub const CORNER_RADIUS: u8 = 6;
pub const BORDER_WIDTH: f32 = 1.0;
pub const TITLE_FONT_SIZE: f32 = 12.0;
pub const TITLE_BUTTON_SIZE: f32 = 16.0;
pub const TITLE_BUTTON_GAP: f32 = 4.0;
pub const RESIZE_GRIP_SIZE: f32 = 12.0;

/// Rows
pub const ICON_CORNER_RADIUS: u8 = 3;
pub const ICON_TEXT_GAP: f32 = 6.0;

/// A move/resize counts as finished after this long without change,
/// even if the release never reached us
pub const GESTURE_SETTLE_MS: u64 = 300;
