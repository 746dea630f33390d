//! Overlay window implemented with egui/eframe

mod constants;
mod gesture;
mod window;

pub use window::run_gui;

use crate::color::Color;

impl From<Color> for egui::Color32 {
    fn from(color: Color) -> Self {
        egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
    }
}

/// Window title for the given character name
pub fn window_title(character_name: &str) -> String {
    if character_name.is_empty() {
        constants::APP_NAME.to_string()
    } else {
        format!("{} - {}", constants::APP_NAME, character_name)
    }
}
