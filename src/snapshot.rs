//! Latest known character stats and the per-tick update that feeds them

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::host::{EMPTY_SLOT_ID, IDLE_ANIMATION_ID, INVENTORY_CAPACITY};

/// Raw state the host reports once per tick
///
/// `None` in an optional field means the host could not read it this tick
/// (screen transitions, loading, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHostState {
    pub current_hp: u32,
    pub max_hp: u32,
    pub current_prayer: u32,
    pub max_prayer: u32,
    #[serde(default = "default_animation_id")]
    pub animation_id: i32,
    #[serde(default)]
    pub pose_id: i32,
    #[serde(default)]
    pub idle_pose_id: i32,
    #[serde(default)]
    pub is_interacting: bool,
    #[serde(default)]
    pub inventory: Option<Vec<Option<i32>>>,
    #[serde(default)]
    pub character_name: Option<String>,
    #[serde(default)]
    pub overhead_icon: Option<String>,
}

fn default_animation_id() -> i32 {
    IDLE_ANIMATION_ID
}

/// Same as an empty payload on the wire: a standing, idle character
impl Default for RawHostState {
    fn default() -> Self {
        Self {
            current_hp: 0,
            max_hp: 0,
            current_prayer: 0,
            max_prayer: 0,
            animation_id: IDLE_ANIMATION_ID,
            pose_id: 0,
            idle_pose_id: 0,
            is_interacting: false,
            inventory: None,
            character_name: None,
            overhead_icon: None,
        }
    }
}

impl RawHostState {
    /// The three activity signals, in the shape the idle classifier consumes
    pub fn activity(&self) -> ActivitySignals {
        ActivitySignals {
            animation_id: self.animation_id,
            pose_id: self.pose_id,
            idle_pose_id: self.idle_pose_id,
            is_interacting: self.is_interacting,
        }
    }
}

/// Per-tick activity signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySignals {
    pub animation_id: i32,
    pub pose_id: i32,
    pub idle_pose_id: i32,
    pub is_interacting: bool,
}

impl ActivitySignals {
    /// Acting if any signal shows activity: animation catches skilling,
    /// pose catches walking/running, interaction catches standing combat.
    pub fn is_acting(&self) -> bool {
        self.animation_id != IDLE_ANIMATION_ID
            || self.pose_id != self.idle_pose_id
            || self.is_interacting
    }
}

/// Active protection prayer, derived from the overhead icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protection {
    #[default]
    None,
    Melee,
    Ranged,
    Magic,
}

impl Protection {
    /// Classify an overhead icon name (e.g. `PROTECT_FROM_MISSILES`)
    pub fn from_overhead_icon(icon: Option<&str>) -> Self {
        let Some(icon) = icon else {
            return Self::None;
        };
        let icon = icon.to_ascii_uppercase();
        if icon.contains("MELEE") {
            Self::Melee
        } else if icon.contains("MISSILES") || icon.contains("RANGED") {
            Self::Ranged
        } else if icon.contains("MAGIC") {
            Self::Magic
        } else {
            Self::None
        }
    }
}

/// Integer percentage, 0 when `max` is 0
pub fn percentage(current: u32, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    ((u64::from(current) * 100) / u64::from(max)) as u32
}

/// Count present items; a missing container counts as empty
pub fn count_used_slots(inventory: Option<&[Option<i32>]>) -> u32 {
    let Some(items) = inventory else {
        return 0;
    };
    let used = items
        .iter()
        .filter(|slot| matches!(slot, Some(id) if *id != EMPTY_SLOT_ID))
        .count() as u32;
    used.min(INVENTORY_CAPACITY)
}

/// What changed in a tick, beyond the numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotChanges {
    pub name_changed: bool,
    pub protection_changed: bool,
}

/// Latest known values of all monitored stats
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatSnapshot {
    pub current_hp: u32,
    pub max_hp: u32,
    pub current_prayer: u32,
    pub max_prayer: u32,
    pub inventory_used_slots: u32,
    pub character_name: String,
    pub active_protection: Protection,
    /// Written by the idle classifier only
    pub idle: bool,
}

impl StatSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hp_percentage(&self) -> u32 {
        percentage(self.current_hp, self.max_hp)
    }

    pub fn prayer_percentage(&self) -> u32 {
        percentage(self.current_prayer, self.max_prayer)
    }

    pub fn inventory_percentage(&self) -> u32 {
        percentage(self.inventory_used_slots, INVENTORY_CAPACITY)
    }

    /// Fold one tick of raw host state into the snapshot.
    /// Leaves `idle` alone.
    pub fn apply_tick(&mut self, raw: &RawHostState) -> SnapshotChanges {
        // Zeroed pairs show up around login; keep the last good values
        if raw.current_hp > 0 && raw.max_hp > 0 {
            self.current_hp = raw.current_hp;
            self.max_hp = raw.max_hp;
        }
        if raw.current_prayer > 0 && raw.max_prayer > 0 {
            self.current_prayer = raw.current_prayer;
            self.max_prayer = raw.max_prayer;
        }

        self.inventory_used_slots = count_used_slots(raw.inventory.as_deref());

        let mut changes = SnapshotChanges::default();

        if let Some(name) = raw.character_name.as_deref()
            && name != self.character_name
        {
            debug!(old = %self.character_name, new = %name, "Character name updated");
            self.character_name = name.to_string();
            changes.name_changed = true;
        }

        let protection = Protection::from_overhead_icon(raw.overhead_icon.as_deref());
        if protection != self.active_protection {
            self.active_protection = protection;
            changes.protection_changed = true;
        }

        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(hp: (u32, u32), prayer: (u32, u32)) -> RawHostState {
        RawHostState {
            current_hp: hp.0,
            max_hp: hp.1,
            current_prayer: prayer.0,
            max_prayer: prayer.1,
            animation_id: IDLE_ANIMATION_ID,
            ..Default::default()
        }
    }

    #[test]
    fn test_percentage_zero_max() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(50, 0), 0);
        assert_eq!(StatSnapshot::new().hp_percentage(), 0);
    }

    #[test]
    fn test_percentage_truncates() {
        assert_eq!(percentage(9, 100), 9);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(99, 99), 100);
    }

    #[test]
    fn test_apply_tick_updates_positive_pairs() {
        let mut snapshot = StatSnapshot::new();
        snapshot.apply_tick(&raw((80, 99), (40, 70)));
        assert_eq!((snapshot.current_hp, snapshot.max_hp), (80, 99));
        assert_eq!((snapshot.current_prayer, snapshot.max_prayer), (40, 70));
    }

    #[test]
    fn test_apply_tick_keeps_previous_on_zeroed_read() {
        let mut snapshot = StatSnapshot::new();
        snapshot.apply_tick(&raw((80, 99), (40, 70)));
        snapshot.apply_tick(&raw((0, 0), (0, 70)));
        assert_eq!((snapshot.current_hp, snapshot.max_hp), (80, 99));
        assert_eq!((snapshot.current_prayer, snapshot.max_prayer), (40, 70));
    }

    #[test]
    fn test_drained_prayer_is_not_recorded() {
        // current=0 is indistinguishable from a transient read
        let mut snapshot = StatSnapshot::new();
        snapshot.apply_tick(&raw((80, 99), (5, 70)));
        snapshot.apply_tick(&raw((80, 99), (0, 70)));
        assert_eq!(snapshot.current_prayer, 5);
    }

    #[test]
    fn test_inventory_counts_present_items() {
        let items = vec![Some(995), None, Some(EMPTY_SLOT_ID), Some(1511), Some(0)];
        assert_eq!(count_used_slots(Some(&items)), 3);
    }

    #[test]
    fn test_inventory_read_failure_is_zero() {
        let mut snapshot = StatSnapshot::new();
        snapshot.apply_tick(&RawHostState {
            inventory: Some(vec![Some(1); 10]),
            ..Default::default()
        });
        assert_eq!(snapshot.inventory_used_slots, 10);

        snapshot.apply_tick(&RawHostState::default());
        assert_eq!(snapshot.inventory_used_slots, 0);
    }

    #[test]
    fn test_inventory_capped_at_capacity() {
        let items = vec![Some(1); 40];
        assert_eq!(count_used_slots(Some(&items)), INVENTORY_CAPACITY);
    }

    #[test]
    fn test_protection_classification() {
        assert_eq!(Protection::from_overhead_icon(Some("MELEE")), Protection::Melee);
        assert_eq!(Protection::from_overhead_icon(Some("PROTECT_FROM_MISSILES")), Protection::Ranged);
        assert_eq!(Protection::from_overhead_icon(Some("RANGED")), Protection::Ranged);
        assert_eq!(Protection::from_overhead_icon(Some("magic")), Protection::Magic);
        assert_eq!(Protection::from_overhead_icon(Some("SMITE")), Protection::None);
        assert_eq!(Protection::from_overhead_icon(None), Protection::None);
    }

    #[test]
    fn test_protection_change_signalled_once() {
        let mut snapshot = StatSnapshot::new();
        let tick = RawHostState {
            overhead_icon: Some("MAGIC".to_string()),
            ..Default::default()
        };
        assert!(snapshot.apply_tick(&tick).protection_changed);
        assert!(!snapshot.apply_tick(&tick).protection_changed);
        assert_eq!(snapshot.active_protection, Protection::Magic);
        assert!(snapshot.apply_tick(&RawHostState::default()).protection_changed);
        assert_eq!(snapshot.active_protection, Protection::None);
    }

    #[test]
    fn test_name_change_signal_only_on_difference() {
        let mut snapshot = StatSnapshot::new();
        let tick = RawHostState {
            character_name: Some("Zezima".to_string()),
            ..Default::default()
        };
        assert!(snapshot.apply_tick(&tick).name_changed);
        assert!(!snapshot.apply_tick(&tick).name_changed);
        assert_eq!(snapshot.character_name, "Zezima");
    }

    #[test]
    fn test_missing_name_keeps_prior() {
        let mut snapshot = StatSnapshot::new();
        snapshot.apply_tick(&RawHostState {
            character_name: Some("Zezima".to_string()),
            ..Default::default()
        });
        let changes = snapshot.apply_tick(&RawHostState::default());
        assert!(!changes.name_changed);
        assert_eq!(snapshot.character_name, "Zezima");
    }

    #[test]
    fn test_apply_tick_never_touches_idle() {
        let mut snapshot = StatSnapshot::new();
        snapshot.idle = true;
        snapshot.apply_tick(&raw((10, 10), (10, 10)));
        assert!(snapshot.idle);
    }

    #[test]
    fn test_activity_signals_or_combination() {
        let still = ActivitySignals {
            animation_id: IDLE_ANIMATION_ID,
            pose_id: 808,
            idle_pose_id: 808,
            is_interacting: false,
        };
        assert!(!still.is_acting());
        assert!(ActivitySignals { animation_id: 879, ..still }.is_acting());
        assert!(ActivitySignals { pose_id: 819, ..still }.is_acting());
        assert!(ActivitySignals { is_interacting: true, ..still }.is_acting());
    }

    #[test]
    fn test_raw_state_deserializes_with_defaults() {
        let raw: RawHostState =
            serde_json::from_str(r#"{"current_hp":5,"max_hp":10,"current_prayer":1,"max_prayer":2}"#)
                .unwrap();
        assert_eq!(raw.animation_id, IDLE_ANIMATION_ID);
        assert_eq!(raw.inventory, None);
        assert!(!raw.activity().is_acting());
    }

    #[test]
    fn test_default_raw_state_matches_empty_payload() {
        let decoded: RawHostState =
            serde_json::from_str(r#"{"current_hp":0,"max_hp":0,"current_prayer":0,"max_prayer":0}"#)
                .unwrap();
        let default = RawHostState::default();
        assert_eq!(default, decoded);
        assert_eq!(default.animation_id, IDLE_ANIMATION_ID);
        assert!(!default.activity().is_acting());
    }
}
