//! Overlay settings
//!
//! Flat TOML file, one key per setting. The same key names are used by the
//! host's `ConfigChanged { key, value }` notifications.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::color::{palette, Color};
use crate::constants::{defaults, host::INVENTORY_CAPACITY, paths};
use crate::highlight::{
    HighlightConfig, IdleRule, InventoryMode, InventoryRule, ThresholdRule, ThresholdUnit,
};
use crate::layout::VisibleRows;

/// Longest idle threshold accepted (10 minutes)
const MAX_IDLE_THRESHOLD_MS: u64 = 10 * 60 * 1000;

/// Setting keys
pub mod keys {
    pub const SHOW_HP: &str = "show_hp";
    pub const SHOW_PRAYER: &str = "show_prayer";
    pub const SHOW_INVENTORY: &str = "show_inventory";
    pub const SHOW_STATUS: &str = "show_status";
    pub const SHOW_CLOSE_BUTTON: &str = "show_close_button";
    pub const SHOW_MINIMIZE_BUTTON: &str = "show_minimize_button";
    pub const OPACITY: &str = "opacity";
    pub const IDLE_THRESHOLD_MS: &str = "idle_threshold_ms";

    pub const HP_HIGHLIGHT_ENABLED: &str = "hp_highlight_enabled";
    pub const HP_THRESHOLD: &str = "hp_threshold";
    pub const HP_THRESHOLD_UNIT: &str = "hp_threshold_unit";
    pub const HP_HIGHLIGHT_COLOR: &str = "hp_highlight_color";

    pub const PRAYER_HIGHLIGHT_ENABLED: &str = "prayer_highlight_enabled";
    pub const PRAYER_THRESHOLD: &str = "prayer_threshold";
    pub const PRAYER_THRESHOLD_UNIT: &str = "prayer_threshold_unit";
    pub const PRAYER_HIGHLIGHT_COLOR: &str = "prayer_highlight_color";

    pub const IDLE_HIGHLIGHT_ENABLED: &str = "idle_highlight_enabled";
    pub const IDLE_HIGHLIGHT_COLOR: &str = "idle_highlight_color";

    pub const INVENTORY_HIGHLIGHT_ENABLED: &str = "inventory_highlight_enabled";
    pub const INVENTORY_THRESHOLD: &str = "inventory_threshold";
    pub const INVENTORY_THRESHOLD_UNIT: &str = "inventory_threshold_unit";
    pub const INVENTORY_MODE: &str = "inventory_mode";
    pub const INVENTORY_HIGHLIGHT_COLOR: &str = "inventory_highlight_color";

    pub const RESTORE_OVERLAY: &str = "restore_overlay";
    pub const RESET_POSITION: &str = "reset_position";
}

/// What a setting change requires the overlay to recompute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEffect {
    /// Row visibility changed
    Layout,
    /// Threshold, color, opacity or idle timing changed
    Highlight,
    /// Title bar buttons changed
    Chrome,
    /// `restore_overlay` was set
    RestoreOverlay,
    /// `reset_position` was set
    ResetPosition,
    /// Unknown key, rejected value, or a command toggle set to false
    Nothing,
}

/// User settings, persisted as TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub show_hp: bool,
    pub show_prayer: bool,
    pub show_inventory: bool,
    pub show_status: bool,
    pub show_close_button: bool,
    pub show_minimize_button: bool,

    /// Background alpha, 0 (transparent) to 255 (opaque)
    pub opacity: u8,
    pub idle_threshold_ms: u64,

    pub hp_highlight_enabled: bool,
    pub hp_threshold: u32,
    pub hp_threshold_unit: ThresholdUnit,
    #[serde(rename = "hp_highlight_color")]
    pub hp_highlight_color_hex: String,

    pub prayer_highlight_enabled: bool,
    pub prayer_threshold: u32,
    pub prayer_threshold_unit: ThresholdUnit,
    #[serde(rename = "prayer_highlight_color")]
    pub prayer_highlight_color_hex: String,

    pub idle_highlight_enabled: bool,
    #[serde(rename = "idle_highlight_color")]
    pub idle_highlight_color_hex: String,

    pub inventory_highlight_enabled: bool,
    pub inventory_threshold: u32,
    pub inventory_threshold_unit: ThresholdUnit,
    pub inventory_mode: InventoryMode,
    #[serde(rename = "inventory_highlight_color")]
    pub inventory_highlight_color_hex: String,

    /// Edge-triggered command toggles, consumed and reset to false
    #[serde(skip_serializing)]
    pub restore_overlay: bool,
    #[serde(skip_serializing)]
    pub reset_position: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            show_hp: true,
            show_prayer: true,
            show_inventory: true,
            show_status: true,
            show_close_button: true,
            show_minimize_button: true,
            opacity: defaults::OPACITY,
            idle_threshold_ms: defaults::IDLE_THRESHOLD_MS,
            hp_highlight_enabled: false,
            hp_threshold: 10,
            hp_threshold_unit: ThresholdUnit::Absolute,
            hp_highlight_color_hex: palette::HIGHLIGHT_HP.to_hex_string(),
            prayer_highlight_enabled: false,
            prayer_threshold: 10,
            prayer_threshold_unit: ThresholdUnit::Absolute,
            prayer_highlight_color_hex: palette::HIGHLIGHT_PRAYER.to_hex_string(),
            idle_highlight_enabled: false,
            idle_highlight_color_hex: palette::HIGHLIGHT_IDLE.to_hex_string(),
            inventory_highlight_enabled: false,
            inventory_threshold: 27,
            inventory_threshold_unit: ThresholdUnit::Absolute,
            inventory_mode: InventoryMode::Above,
            inventory_highlight_color_hex: palette::HIGHLIGHT_INVENTORY.to_hex_string(),
            restore_overlay: false,
            reset_position: false,
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .inspect_err(|e| warn!(key = %key, value = %value, error = %e, "Rejected config value"))
        .ok()
}

fn parse_color(key: &str, value: &str) -> Option<String> {
    let color = Color::parse_hex(value);
    if color.is_none() {
        warn!(key = %key, value = %value, "Rejected config color, expected #RRGGBB or #AARRGGBB");
    }
    color.map(|c| c.to_hex_string())
}

fn parse_env_value<T: FromStr>(var: &str, value: &str) -> Option<T>
where
    <T as FromStr>::Err: std::fmt::Debug,
{
    value
        .trim()
        .parse::<T>()
        .inspect_err(|e| error!(var = %var, value = %value, error = ?e, "failed to parse env var"))
        .ok()
}

fn resolve_color(key: &str, hex: &str, fallback: Color) -> Color {
    Color::parse_hex(hex).unwrap_or_else(|| {
        error!(key = %key, color = %hex, "Invalid color hex, using default");
        fallback
    })
}

impl OverlayConfig {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(paths::APP_DIR);
        path.push(paths::CONFIG_FILENAME);
        path
    }

    /// Load settings from `path`.
    ///
    /// A missing file is generated from defaults and env overrides. A file
    /// that fails to parse is left untouched and defaults are used.
    pub fn load_from(path: &Path) -> Self {
        if let Ok(contents) = fs::read_to_string(path) {
            match toml::from_str::<OverlayConfig>(&contents) {
                Ok(mut config) => {
                    config.apply_env_overrides();
                    config.validate_and_clamp();
                    info!(path = %path.display(), "Loaded overlay config");
                    return config;
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to parse config file");
                    error!(path = %path.display(), "The file has been preserved, running with defaults until it is fixed");
                    let mut config = Self::default();
                    config.apply_env_overrides();
                    config.validate_and_clamp();
                    return config;
                }
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate_and_clamp();

        if let Err(e) = config
            .save_to(path)
            .context(format!("Failed to save new config to {}", path.display()))
        {
            error!(error = ?e, "Failed to save config");
        } else {
            info!(path = %path.display(), "Generated config file for user to edit (env vars still override)");
        }
        config
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        fs::write(path, contents)
            .context(format!("Failed to write config file to {}", path.display()))?;
        Ok(())
    }

    fn parse_num<T: FromStr>(var: &str) -> Option<T>
    where
        <T as FromStr>::Err: std::fmt::Debug,
    {
        parse_env_value(var, &env::var(var).ok()?)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(opacity) = Self::parse_num("OPACITY") {
            self.opacity = opacity;
        }
        if let Some(threshold) = Self::parse_num("IDLE_THRESHOLD_MS") {
            self.idle_threshold_ms = threshold;
        }
    }

    /// Clamp values to safe ranges and repair bad colors
    fn validate_and_clamp(&mut self) {
        if self.idle_threshold_ms > MAX_IDLE_THRESHOLD_MS {
            warn!(idle_threshold_ms = self.idle_threshold_ms, max = MAX_IDLE_THRESHOLD_MS, "idle_threshold_ms exceeds maximum, clamping");
            self.idle_threshold_ms = MAX_IDLE_THRESHOLD_MS;
        }

        for (name, unit, threshold) in [
            ("hp_threshold", self.hp_threshold_unit, &mut self.hp_threshold),
            ("prayer_threshold", self.prayer_threshold_unit, &mut self.prayer_threshold),
        ] {
            if unit == ThresholdUnit::Percent && *threshold > 100 {
                warn!(key = name, threshold = *threshold, "Percent threshold exceeds 100, clamping");
                *threshold = 100;
            }
        }

        let inventory_max = match self.inventory_threshold_unit {
            ThresholdUnit::Absolute => INVENTORY_CAPACITY,
            ThresholdUnit::Percent => 100,
        };
        if self.inventory_threshold > inventory_max {
            warn!(threshold = self.inventory_threshold, max = inventory_max, "inventory_threshold exceeds maximum, clamping");
            self.inventory_threshold = inventory_max;
        }

        let defaults = Self::default();
        for (name, hex, fallback) in [
            ("hp_highlight_color", &mut self.hp_highlight_color_hex, defaults.hp_highlight_color_hex),
            ("prayer_highlight_color", &mut self.prayer_highlight_color_hex, defaults.prayer_highlight_color_hex),
            ("idle_highlight_color", &mut self.idle_highlight_color_hex, defaults.idle_highlight_color_hex),
            ("inventory_highlight_color", &mut self.inventory_highlight_color_hex, defaults.inventory_highlight_color_hex),
        ] {
            match Color::parse_hex(hex) {
                Some(color) => *hex = color.to_hex_string(),
                None => {
                    warn!(key = name, color = %hex, using = %fallback, "Invalid color hex, using default");
                    *hex = fallback;
                }
            }
        }

        // A command toggle read back from disk is stale, not a fresh edge
        if self.restore_overlay || self.reset_position {
            info!("Clearing command toggles found in config file");
            self.restore_overlay = false;
            self.reset_position = false;
        }
    }

    /// Apply one `key = value` change from the host.
    ///
    /// Rejected values are logged and leave the setting unchanged.
    pub fn apply_change(&mut self, key: &str, value: &str) -> ConfigEffect {
        use keys::*;

        fn set<T>(slot: &mut T, parsed: Option<T>, effect: ConfigEffect) -> ConfigEffect {
            match parsed {
                Some(value) => {
                    *slot = value;
                    effect
                }
                None => ConfigEffect::Nothing,
            }
        }

        let effect = match key {
            SHOW_HP => set(&mut self.show_hp, parse_value(key, value), ConfigEffect::Layout),
            SHOW_PRAYER => set(&mut self.show_prayer, parse_value(key, value), ConfigEffect::Layout),
            SHOW_INVENTORY => set(&mut self.show_inventory, parse_value(key, value), ConfigEffect::Layout),
            SHOW_STATUS => set(&mut self.show_status, parse_value(key, value), ConfigEffect::Layout),
            SHOW_CLOSE_BUTTON => set(&mut self.show_close_button, parse_value(key, value), ConfigEffect::Chrome),
            SHOW_MINIMIZE_BUTTON => set(&mut self.show_minimize_button, parse_value(key, value), ConfigEffect::Chrome),
            OPACITY => set(&mut self.opacity, parse_value(key, value), ConfigEffect::Highlight),
            IDLE_THRESHOLD_MS => set(
                &mut self.idle_threshold_ms,
                parse_value::<u64>(key, value).map(|ms| ms.min(MAX_IDLE_THRESHOLD_MS)),
                ConfigEffect::Highlight,
            ),

            HP_HIGHLIGHT_ENABLED => set(&mut self.hp_highlight_enabled, parse_value(key, value), ConfigEffect::Highlight),
            HP_THRESHOLD => set(&mut self.hp_threshold, parse_value(key, value), ConfigEffect::Highlight),
            HP_THRESHOLD_UNIT => set(&mut self.hp_threshold_unit, parse_value(key, value), ConfigEffect::Highlight),
            HP_HIGHLIGHT_COLOR => set(&mut self.hp_highlight_color_hex, parse_color(key, value), ConfigEffect::Highlight),

            PRAYER_HIGHLIGHT_ENABLED => set(&mut self.prayer_highlight_enabled, parse_value(key, value), ConfigEffect::Highlight),
            PRAYER_THRESHOLD => set(&mut self.prayer_threshold, parse_value(key, value), ConfigEffect::Highlight),
            PRAYER_THRESHOLD_UNIT => set(&mut self.prayer_threshold_unit, parse_value(key, value), ConfigEffect::Highlight),
            PRAYER_HIGHLIGHT_COLOR => set(&mut self.prayer_highlight_color_hex, parse_color(key, value), ConfigEffect::Highlight),

            IDLE_HIGHLIGHT_ENABLED => set(&mut self.idle_highlight_enabled, parse_value(key, value), ConfigEffect::Highlight),
            IDLE_HIGHLIGHT_COLOR => set(&mut self.idle_highlight_color_hex, parse_color(key, value), ConfigEffect::Highlight),

            INVENTORY_HIGHLIGHT_ENABLED => set(&mut self.inventory_highlight_enabled, parse_value(key, value), ConfigEffect::Highlight),
            INVENTORY_THRESHOLD => set(&mut self.inventory_threshold, parse_value(key, value), ConfigEffect::Highlight),
            INVENTORY_THRESHOLD_UNIT => set(&mut self.inventory_threshold_unit, parse_value(key, value), ConfigEffect::Highlight),
            INVENTORY_MODE => set(&mut self.inventory_mode, parse_value(key, value), ConfigEffect::Highlight),
            INVENTORY_HIGHLIGHT_COLOR => set(&mut self.inventory_highlight_color_hex, parse_color(key, value), ConfigEffect::Highlight),

            RESTORE_OVERLAY | RESET_POSITION => match parse_value::<bool>(key, value) {
                Some(true) if key == RESTORE_OVERLAY => ConfigEffect::RestoreOverlay,
                Some(true) => ConfigEffect::ResetPosition,
                _ => ConfigEffect::Nothing,
            },

            _ => {
                warn!(key = %key, "Ignoring unknown config key");
                ConfigEffect::Nothing
            }
        };

        info!(key = %key, value = %value, effect = ?effect, "Config changed");
        effect
    }

    pub fn visible_rows(&self) -> VisibleRows {
        VisibleRows {
            hp: self.show_hp,
            prayer: self.show_prayer,
            inventory: self.show_inventory,
            status: self.show_status,
        }
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_millis(self.idle_threshold_ms)
    }

    /// Build the resolved highlight rules from current settings
    pub fn build_highlight_config(&self) -> HighlightConfig {
        HighlightConfig {
            hp: ThresholdRule {
                enabled: self.hp_highlight_enabled,
                threshold: self.hp_threshold,
                unit: self.hp_threshold_unit,
                color: resolve_color(keys::HP_HIGHLIGHT_COLOR, &self.hp_highlight_color_hex, palette::HIGHLIGHT_HP),
            },
            prayer: ThresholdRule {
                enabled: self.prayer_highlight_enabled,
                threshold: self.prayer_threshold,
                unit: self.prayer_threshold_unit,
                color: resolve_color(keys::PRAYER_HIGHLIGHT_COLOR, &self.prayer_highlight_color_hex, palette::HIGHLIGHT_PRAYER),
            },
            idle: IdleRule {
                enabled: self.idle_highlight_enabled,
                color: resolve_color(keys::IDLE_HIGHLIGHT_COLOR, &self.idle_highlight_color_hex, palette::HIGHLIGHT_IDLE),
            },
            inventory: InventoryRule {
                enabled: self.inventory_highlight_enabled,
                threshold: self.inventory_threshold,
                unit: self.inventory_threshold_unit,
                mode: self.inventory_mode,
                color: resolve_color(keys::INVENTORY_HIGHLIGHT_COLOR, &self.inventory_highlight_color_hex, palette::HIGHLIGHT_INVENTORY),
            },
            base: HighlightConfig::base_color(self.opacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_change_is_layout() {
        let mut config = OverlayConfig::default();
        assert_eq!(config.apply_change(keys::SHOW_PRAYER, "false"), ConfigEffect::Layout);
        assert!(!config.visible_rows().prayer);
        assert_eq!(config.visible_rows().count(), 3);
    }

    #[test]
    fn test_threshold_and_color_changes_are_highlight() {
        let mut config = OverlayConfig::default();
        assert_eq!(config.apply_change(keys::HP_THRESHOLD, "25"), ConfigEffect::Highlight);
        assert_eq!(config.apply_change(keys::HP_HIGHLIGHT_COLOR, "#00FF00"), ConfigEffect::Highlight);
        assert_eq!(config.hp_threshold, 25);
        assert_eq!(config.hp_highlight_color_hex, "#FF00FF00");
        assert_eq!(config.build_highlight_config().hp.color, Color::rgb(0, 255, 0));
    }

    #[test]
    fn test_rejected_value_leaves_setting() {
        let mut config = OverlayConfig::default();
        assert_eq!(config.apply_change(keys::HP_THRESHOLD, "lots"), ConfigEffect::Nothing);
        assert_eq!(config.apply_change(keys::OPACITY, "300"), ConfigEffect::Nothing);
        assert_eq!(config.apply_change(keys::IDLE_HIGHLIGHT_COLOR, "purple"), ConfigEffect::Nothing);
        assert_eq!(config, OverlayConfig::default());
    }

    #[test]
    fn test_unknown_key_ignored() {
        let mut config = OverlayConfig::default();
        assert_eq!(config.apply_change("theme", "light"), ConfigEffect::Nothing);
    }

    #[test]
    fn test_inventory_mode_change() {
        let mut config = OverlayConfig::default();
        assert_eq!(config.apply_change(keys::INVENTORY_MODE, "BELOW"), ConfigEffect::Highlight);
        assert_eq!(config.build_highlight_config().inventory.mode, InventoryMode::Below);
    }

    #[test]
    fn test_command_toggles_are_edge_triggered() {
        let mut config = OverlayConfig::default();
        assert_eq!(config.apply_change(keys::RESTORE_OVERLAY, "true"), ConfigEffect::RestoreOverlay);
        assert_eq!(config.apply_change(keys::RESET_POSITION, "true"), ConfigEffect::ResetPosition);
        assert_eq!(config.apply_change(keys::RESET_POSITION, "false"), ConfigEffect::Nothing);
        assert!(!config.restore_overlay);
        assert!(!config.reset_position);
    }

    #[test]
    fn test_chrome_keys() {
        let mut config = OverlayConfig::default();
        assert_eq!(config.apply_change(keys::SHOW_CLOSE_BUTTON, "false"), ConfigEffect::Chrome);
        assert!(!config.show_close_button);
    }

    #[test]
    fn test_idle_threshold_capped() {
        let mut config = OverlayConfig::default();
        config.apply_change(keys::IDLE_THRESHOLD_MS, "99999999");
        assert_eq!(config.idle_threshold(), Duration::from_millis(MAX_IDLE_THRESHOLD_MS));
    }

    #[test]
    fn test_base_color_uses_opacity() {
        let mut config = OverlayConfig::default();
        config.apply_change(keys::OPACITY, "128");
        assert_eq!(config.build_highlight_config().base, Color::rgba(30, 30, 30, 128));
    }

    #[test]
    fn test_validate_and_clamp() {
        let mut config = OverlayConfig {
            hp_threshold_unit: ThresholdUnit::Percent,
            hp_threshold: 150,
            inventory_threshold: 40,
            idle_highlight_color_hex: "nope".to_string(),
            prayer_highlight_color_hex: "102030".to_string(),
            reset_position: true,
            ..Default::default()
        };
        config.validate_and_clamp();
        assert_eq!(config.hp_threshold, 100);
        assert_eq!(config.inventory_threshold, INVENTORY_CAPACITY);
        assert_eq!(config.idle_highlight_color_hex, palette::HIGHLIGHT_IDLE.to_hex_string());
        assert_eq!(config.prayer_highlight_color_hex, "#FF102030");
        assert!(!config.reset_position);
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let config: OverlayConfig = toml::from_str("show_prayer = false\nopacity = 90\n").unwrap();
        assert!(!config.show_prayer);
        assert_eq!(config.opacity, 90);
        assert!(config.show_hp);
        assert_eq!(config.inventory_mode, InventoryMode::Above);
    }

    #[test]
    fn test_toml_enum_spelling() {
        let config: OverlayConfig =
            toml::from_str("inventory_mode = \"below\"\nhp_threshold_unit = \"percent\"\n").unwrap();
        assert_eq!(config.inventory_mode, InventoryMode::Below);
        assert_eq!(config.hp_threshold_unit, ThresholdUnit::Percent);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(paths::APP_DIR).join(paths::CONFIG_FILENAME);
        let mut config = OverlayConfig::default();
        config.apply_change(keys::SHOW_STATUS, "false");
        config.apply_change(keys::HP_HIGHLIGHT_ENABLED, "true");
        config.save_to(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("restore_overlay"));

        let loaded = OverlayConfig::load_from(&path);
        assert!(!loaded.show_status);
        assert!(loaded.hp_highlight_enabled);
    }

    #[test]
    fn test_broken_file_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(paths::CONFIG_FILENAME);
        fs::write(&path, "show_hp = maybe").unwrap();

        let loaded = OverlayConfig::load_from(&path);
        assert!(loaded.show_hp);
        assert_eq!(fs::read_to_string(&path).unwrap(), "show_hp = maybe");
    }

    #[test]
    fn test_env_values_parse_as_plain_decimal() {
        assert_eq!(parse_env_value::<u8>("OPACITY", " 128 "), Some(128));
        assert_eq!(parse_env_value::<u64>("IDLE_THRESHOLD_MS", "5000"), Some(5000));
        assert_eq!(parse_env_value::<u64>("IDLE_THRESHOLD_MS", "0x10"), None);
        assert_eq!(parse_env_value::<u8>("OPACITY", "300"), None);
    }
}
