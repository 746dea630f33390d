//! Background highlight rules
//!
//! Rules are checked in a fixed priority order and the first match paints the
//! background. Vital stats come before the idle tint; the order is
//! [`RULE_PRIORITY`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::{palette, Color};
use crate::snapshot::StatSnapshot;

/// How a threshold is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdUnit {
    #[default]
    Absolute,
    Percent,
}

/// Inventory comparison direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryMode {
    /// Highlight when more than `threshold` slots are used
    #[default]
    Above,
    /// Highlight when fewer than `threshold` slots are used
    Below,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised value '{0}'")]
pub struct ParseEnumError(String);

impl FromStr for ThresholdUnit {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "absolute" | "count" => Ok(Self::Absolute),
            "percent" | "percentage" => Ok(Self::Percent),
            _ => Err(ParseEnumError(s.to_string())),
        }
    }
}

impl FromStr for InventoryMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "above" => Ok(Self::Above),
            "below" => Ok(Self::Below),
            _ => Err(ParseEnumError(s.to_string())),
        }
    }
}

/// `value <= threshold` rule for a current/max stat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdRule {
    pub enabled: bool,
    pub threshold: u32,
    pub unit: ThresholdUnit,
    pub color: Color,
}

impl ThresholdRule {
    fn at_or_below(&self, current: u32, percent: u32) -> bool {
        let value = match self.unit {
            ThresholdUnit::Absolute => current,
            ThresholdUnit::Percent => percent,
        };
        self.enabled && value <= self.threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleRule {
    pub enabled: bool,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryRule {
    pub enabled: bool,
    pub threshold: u32,
    pub unit: ThresholdUnit,
    pub mode: InventoryMode,
    pub color: Color,
}

impl InventoryRule {
    fn triggers(&self, used: u32, percent: u32) -> bool {
        let value = match self.unit {
            ThresholdUnit::Absolute => used,
            ThresholdUnit::Percent => percent,
        };
        self.enabled
            && match self.mode {
                InventoryMode::Above => value > self.threshold,
                InventoryMode::Below => value < self.threshold,
            }
    }
}

/// Resolved (parsed) highlight settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightConfig {
    pub hp: ThresholdRule,
    pub prayer: ThresholdRule,
    pub idle: IdleRule,
    pub inventory: InventoryRule,
    /// Fill used when no rule matches
    pub base: Color,
}

impl HighlightConfig {
    /// Theme background at the given opacity
    pub fn base_color(opacity: u8) -> Color {
        palette::THEME_BACKGROUND.with_alpha(opacity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Hp,
    Prayer,
    Idle,
    Inventory,
}

/// Evaluation order, first match wins
pub const RULE_PRIORITY: [RuleKind; 4] = [
    RuleKind::Hp,
    RuleKind::Prayer,
    RuleKind::Idle,
    RuleKind::Inventory,
];

impl RuleKind {
    pub fn matches(self, snapshot: &StatSnapshot, config: &HighlightConfig) -> bool {
        match self {
            Self::Hp => config
                .hp
                .at_or_below(snapshot.current_hp, snapshot.hp_percentage()),
            Self::Prayer => config
                .prayer
                .at_or_below(snapshot.current_prayer, snapshot.prayer_percentage()),
            Self::Idle => config.idle.enabled && snapshot.idle,
            Self::Inventory => config
                .inventory
                .triggers(snapshot.inventory_used_slots, snapshot.inventory_percentage()),
        }
    }

    pub fn color(self, config: &HighlightConfig) -> Color {
        match self {
            Self::Hp => config.hp.color,
            Self::Prayer => config.prayer.color,
            Self::Idle => config.idle.color,
            Self::Inventory => config.inventory.color,
        }
    }
}

/// Resolved background and the rule that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background {
    pub color: Color,
    pub rule: Option<RuleKind>,
}

pub fn resolve_background(snapshot: &StatSnapshot, config: &HighlightConfig) -> Background {
    RULE_PRIORITY
        .iter()
        .copied()
        .find(|rule| rule.matches(snapshot, config))
        .map_or(
            Background {
                color: config.base,
                rule: None,
            },
            |rule| Background {
                color: rule.color(config),
                rule: Some(rule),
            },
        )
}
