//! Presentation-ready view of the overlay state
//!
//! Everything a renderer needs, already decided: texts, colors, sizes and
//! which icon goes next to each row.

use serde::Serialize;

use crate::color::{palette, Color};
use crate::constants::host::INVENTORY_CAPACITY;
use crate::constants::tiers::{DANGER_PERCENT, WARNING_PERCENT};
use crate::highlight::{Background, RuleKind};
use crate::layout::{LayoutMetrics, Row, VisibleRows};
use crate::snapshot::{Protection, StatSnapshot};

/// Foreground severity of a stat row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Danger,
    Warning,
    Normal,
}

impl Tier {
    pub fn for_percent(percent: u32) -> Self {
        if percent <= DANGER_PERCENT {
            Self::Danger
        } else if percent <= WARNING_PERCENT {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    /// Tier color, with the row's own color for the normal tier
    pub fn color(self, normal: Color) -> Color {
        match self {
            Self::Danger => palette::DANGER,
            Self::Warning => palette::WARNING,
            Self::Normal => normal,
        }
    }
}

/// Icon shown next to a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconKind {
    Hitpoints,
    Prayer,
    ProtectMelee,
    ProtectRanged,
    ProtectMagic,
    Inventory,
}

impl IconKind {
    /// Prayer row icon for the active protection
    pub fn for_protection(protection: Protection) -> Self {
        match protection {
            Protection::None => Self::Prayer,
            Protection::Melee => Self::ProtectMelee,
            Protection::Ranged => Self::ProtectRanged,
            Protection::Magic => Self::ProtectMagic,
        }
    }

    /// Solid color drawn when the icon asset is unavailable
    pub fn placeholder_color(self) -> Color {
        match self {
            Self::Hitpoints => palette::HP,
            Self::Prayer => palette::PRAYER,
            Self::ProtectMelee => palette::PROTECT_MELEE,
            Self::ProtectRanged => palette::PROTECT_RANGED,
            Self::ProtectMagic => palette::PROTECT_MAGIC,
            Self::Inventory => palette::INVENTORY,
        }
    }
}

pub fn hp_text(snapshot: &StatSnapshot) -> String {
    format!("{}/{} ({}%)", snapshot.current_hp, snapshot.max_hp, snapshot.hp_percentage())
}

pub fn prayer_text(snapshot: &StatSnapshot) -> String {
    format!(
        "{}/{} ({}%)",
        snapshot.current_prayer,
        snapshot.max_prayer,
        snapshot.prayer_percentage()
    )
}

pub fn inventory_text(snapshot: &StatSnapshot) -> String {
    format!(
        "{}/{} ({}%)",
        snapshot.inventory_used_slots,
        INVENTORY_CAPACITY,
        snapshot.inventory_percentage()
    )
}

pub fn status_text(idle: bool) -> &'static str {
    if idle { "Status: IDLE" } else { "Status: ACTIVE" }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub row: Row,
    pub text: String,
    pub color: Color,
    pub icon: Option<IconKind>,
}

impl RowView {
    fn build(row: Row, snapshot: &StatSnapshot) -> Self {
        match row {
            Row::Hp => Self {
                row,
                text: hp_text(snapshot),
                color: Tier::for_percent(snapshot.hp_percentage()).color(palette::TEXT),
                icon: Some(IconKind::Hitpoints),
            },
            Row::Prayer => Self {
                row,
                text: prayer_text(snapshot),
                color: Tier::for_percent(snapshot.prayer_percentage()).color(palette::PRAYER),
                icon: Some(IconKind::for_protection(snapshot.active_protection)),
            },
            // Nearly empty is the danger tier here
            Row::Inventory => Self {
                row,
                text: inventory_text(snapshot),
                color: Tier::for_percent(snapshot.inventory_percentage()).color(palette::TEXT),
                icon: Some(IconKind::Inventory),
            },
            Row::Status => Self {
                row,
                text: status_text(snapshot.idle).to_string(),
                color: if snapshot.idle { palette::IDLE } else { palette::ACTIVE },
                icon: None,
            },
        }
    }
}

/// Title bar buttons to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Chrome {
    pub show_close_button: bool,
    pub show_minimize_button: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderModel {
    pub background: Color,
    #[serde(skip)]
    pub background_rule: Option<RuleKind>,
    pub border: Color,
    pub character_name: String,
    pub rows: Vec<RowView>,
    pub protection_icon: IconKind,
    pub scale_factor: f32,
    pub font_size: f32,
    pub icon_size: f32,
    pub chrome: Chrome,
    pub visible: bool,
}

impl RenderModel {
    pub fn build(
        snapshot: &StatSnapshot,
        background: Background,
        metrics: LayoutMetrics,
        rows: VisibleRows,
        chrome: Chrome,
        visible: bool,
    ) -> Self {
        Self {
            background: background.color,
            background_rule: background.rule,
            border: palette::BORDER,
            character_name: snapshot.character_name.clone(),
            rows: rows.iter().map(|row| RowView::build(row, snapshot)).collect(),
            protection_icon: IconKind::for_protection(snapshot.active_protection),
            scale_factor: metrics.scale_factor,
            font_size: metrics.font_size,
            icon_size: metrics.icon_size,
            chrome,
            visible,
        }
    }

    #[cfg(test)]
    pub fn row(&self, row: Row) -> Option<&RowView> {
        self.rows.iter().find(|view| view.row == row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;

    fn snapshot() -> StatSnapshot {
        StatSnapshot {
            current_hp: 100,
            max_hp: 100,
            current_prayer: 43,
            max_prayer: 70,
            inventory_used_slots: 14,
            character_name: "Zezima".to_string(),
            ..Default::default()
        }
    }

    fn model(snapshot: &StatSnapshot, rows: VisibleRows) -> RenderModel {
        RenderModel::build(
            snapshot,
            Background {
                color: palette::THEME_BACKGROUND,
                rule: None,
            },
            compute_layout(180, rows.count()),
            rows,
            Chrome {
                show_close_button: true,
                show_minimize_button: true,
            },
            true,
        )
    }

    #[test]
    fn test_full_hp_text_and_normal_tier() {
        let snapshot = snapshot();
        assert_eq!(hp_text(&snapshot), "100/100 (100%)");
        let model = model(&snapshot, VisibleRows::default());
        let hp = model.row(Row::Hp).unwrap();
        assert_eq!(hp.text, "100/100 (100%)");
        assert_eq!(hp.color, palette::TEXT);
    }

    #[test]
    fn test_low_hp_danger_tier() {
        let mut snapshot = snapshot();
        snapshot.current_hp = 9;
        let model = model(&snapshot, VisibleRows::default());
        assert_eq!(model.row(Row::Hp).unwrap().color, palette::DANGER);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::for_percent(0), Tier::Danger);
        assert_eq!(Tier::for_percent(10), Tier::Danger);
        assert_eq!(Tier::for_percent(11), Tier::Warning);
        assert_eq!(Tier::for_percent(50), Tier::Warning);
        assert_eq!(Tier::for_percent(51), Tier::Normal);
    }

    #[test]
    fn test_prayer_normal_tier_is_prayer_blue() {
        let model = model(&snapshot(), VisibleRows::default());
        let prayer = model.row(Row::Prayer).unwrap();
        assert_eq!(prayer.text, "43/70 (61%)");
        assert_eq!(prayer.color, palette::PRAYER);
    }

    #[test]
    fn test_inventory_text() {
        let model = model(&snapshot(), VisibleRows::default());
        let inventory = model.row(Row::Inventory).unwrap();
        assert_eq!(inventory.text, "14/28 (50%)");
        assert_eq!(inventory.color, palette::WARNING);
    }

    #[test]
    fn test_status_row() {
        let mut snapshot = snapshot();
        let model_active = model(&snapshot, VisibleRows::default());
        assert_eq!(model_active.row(Row::Status).unwrap().text, "Status: ACTIVE");
        assert_eq!(model_active.row(Row::Status).unwrap().color, palette::ACTIVE);

        snapshot.idle = true;
        let model_idle = model(&snapshot, VisibleRows::default());
        assert_eq!(model_idle.row(Row::Status).unwrap().text, "Status: IDLE");
        assert_eq!(model_idle.row(Row::Status).unwrap().color, palette::IDLE);
    }

    #[test]
    fn test_hidden_rows_not_rendered() {
        let rows = VisibleRows {
            inventory: false,
            status: false,
            ..Default::default()
        };
        let model = model(&snapshot(), rows);
        assert_eq!(model.rows.len(), 2);
        assert!(model.row(Row::Inventory).is_none());
    }

    #[test]
    fn test_protection_icon_selection() {
        let mut snapshot = snapshot();
        assert_eq!(model(&snapshot, VisibleRows::default()).protection_icon, IconKind::Prayer);
        snapshot.active_protection = Protection::Ranged;
        let model = model(&snapshot, VisibleRows::default());
        assert_eq!(model.protection_icon, IconKind::ProtectRanged);
        assert_eq!(model.row(Row::Prayer).unwrap().icon, Some(IconKind::ProtectRanged));
    }

    #[test]
    fn test_empty_stats_render_zero_percent() {
        let model = model(&StatSnapshot::new(), VisibleRows::default());
        assert_eq!(model.row(Row::Hp).unwrap().text, "0/0 (0%)");
        assert_eq!(model.row(Row::Hp).unwrap().color, palette::DANGER);
    }
}
