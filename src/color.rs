//! Color type, hex parsing and the overlay palette

use serde::{Deserialize, Serialize};

/// 8-bit RGBA color, straight (not premultiplied) alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub const fn from_argb32(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    pub const fn argb32(&self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Parse `RRGGBB` or `AARRGGBB`, with or without a leading `#`.
    /// 6-digit colors are fully opaque.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => u32::from_str_radix(hex, 16)
                .ok()
                .map(|rgb| Self::from_argb32(0xFF00_0000 | rgb)),
            8 => u32::from_str_radix(hex, 16).ok().map(Self::from_argb32),
            _ => None,
        }
    }

    /// Always 8-digit `#AARRGGBB`
    pub fn to_hex_string(&self) -> String {
        format!("#{:08X}", self.argb32())
    }
}

/// Fixed colors of the dark theme
pub mod palette {
    use super::Color;

    pub const THEME_BACKGROUND: Color = Color::rgb(30, 30, 30);
    pub const BORDER: Color = Color::rgba(60, 60, 60, 200);
    pub const TEXT: Color = Color::rgb(220, 220, 220);
    pub const BUTTON_HOVER: Color = Color::rgba(0, 0, 0, 120);

    pub const HP: Color = Color::rgb(255, 120, 120);
    pub const PRAYER: Color = Color::rgb(100, 150, 255);
    pub const INVENTORY: Color = Color::rgb(150, 150, 150);
    pub const IDLE: Color = Color::rgb(255, 180, 100);
    pub const ACTIVE: Color = Color::rgb(120, 255, 120);
    pub const WARNING: Color = Color::rgb(255, 200, 100);
    pub const DANGER: Color = Color::rgb(255, 100, 100);

    pub const PROTECT_MELEE: Color = Color::rgb(255, 100, 100);
    pub const PROTECT_RANGED: Color = Color::rgb(100, 255, 100);
    pub const PROTECT_MAGIC: Color = Color::rgb(100, 100, 255);

    // Highlight defaults
    pub const HIGHLIGHT_HP: Color = Color::rgba(200, 40, 40, 200);
    pub const HIGHLIGHT_PRAYER: Color = Color::rgba(40, 80, 200, 200);
    pub const HIGHLIGHT_IDLE: Color = Color::rgba(200, 130, 40, 200);
    pub const HIGHLIGHT_INVENTORY: Color = Color::rgba(40, 150, 60, 200);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_six_digit_is_opaque() {
        assert_eq!(Color::parse_hex("#FF7878"), Some(Color::rgb(255, 120, 120)));
        assert_eq!(Color::parse_hex("ff7878"), Some(Color::rgb(255, 120, 120)));
    }

    #[test]
    fn test_parse_eight_digit_keeps_alpha() {
        assert_eq!(Color::parse_hex("#80102030"), Some(Color::rgba(0x10, 0x20, 0x30, 0x80)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Color::parse_hex(""), None);
        assert_eq!(Color::parse_hex("#12345"), None);
        assert_eq!(Color::parse_hex("not a color"), None);
        assert_eq!(Color::parse_hex("#+1234567"), None);
    }

    #[test]
    fn test_hex_string_is_argb() {
        assert_eq!(palette::BORDER.to_hex_string(), "#C83C3C3C");
        assert_eq!(Color::parse_hex(&palette::HIGHLIGHT_HP.to_hex_string()), Some(palette::HIGHLIGHT_HP));
    }

    #[test]
    fn test_with_alpha() {
        assert_eq!(palette::THEME_BACKGROUND.with_alpha(200), Color::rgba(30, 30, 30, 200));
    }
}
