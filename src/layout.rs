//! Adaptive layout: font and icon scale derived from the window height
//!
//! Everything here is a pure function of the window height and the number of
//! visible rows, so repeated resize events can never accumulate drift.

use serde::{Deserialize, Serialize};

use crate::constants::geometry::{MAX_HEIGHT, MAX_WIDTH, MIN_HEIGHT, MIN_WIDTH};
use crate::constants::layout::*;

/// A stat row of the overlay, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Row {
    Hp,
    Prayer,
    Inventory,
    Status,
}

impl Row {
    pub const ALL: [Row; 4] = [Row::Hp, Row::Prayer, Row::Inventory, Row::Status];
}

/// Which rows are shown, driven by config visibility flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRows {
    pub hp: bool,
    pub prayer: bool,
    pub inventory: bool,
    pub status: bool,
}

impl Default for VisibleRows {
    fn default() -> Self {
        Self {
            hp: true,
            prayer: true,
            inventory: true,
            status: true,
        }
    }
}

impl VisibleRows {
    pub fn contains(&self, row: Row) -> bool {
        match row {
            Row::Hp => self.hp,
            Row::Prayer => self.prayer,
            Row::Inventory => self.inventory,
            Row::Status => self.status,
        }
    }

    /// Visible rows in display order
    pub fn iter(&self) -> impl Iterator<Item = Row> + '_ {
        Row::ALL.into_iter().filter(|row| self.contains(*row))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

/// Derived visual sizes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub scale_factor: f32,
    pub icon_size: f32,
    pub font_size: f32,
}

/// Height needed to show `row_count` rows at scale 1.0
pub fn min_required_height(row_count: usize) -> u32 {
    TITLE_BAR_HEIGHT + row_count as u32 * (BASE_ROW_HEIGHT + ROW_SPACING) + 2 * PADDING
}

pub fn compute_layout(window_height: u32, visible_row_count: usize) -> LayoutMetrics {
    let min_required = min_required_height(visible_row_count);

    // Hold 1.0 just above the minimum so dragging near it doesn't jitter
    let scale_factor = if window_height <= min_required + SCALING_BUFFER {
        1.0
    } else {
        let extra = (window_height - min_required) as f32;
        (1.0 + (extra / 100.0) * SCALING_STEP).min(MAX_SCALING)
    };

    LayoutMetrics {
        scale_factor,
        icon_size: (MIN_ICON_SIZE * scale_factor).clamp(MIN_ICON_SIZE, MAX_ICON_SIZE),
        font_size: (MIN_FONT_SIZE * scale_factor).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
    }
}

/// Current window size and visible rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutState {
    width: u32,
    height: u32,
    pub rows: VisibleRows,
}

impl LayoutState {
    pub fn new(width: i32, height: i32, rows: VisibleRows) -> Self {
        let mut state = Self {
            width: 0,
            height: 0,
            rows,
        };
        state.resize(width, height);
        state
    }

    /// Set the window size, bounded to the supported range
    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width.clamp(MIN_WIDTH, MAX_WIDTH) as u32;
        self.height = height.clamp(MIN_HEIGHT, MAX_HEIGHT) as u32;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn metrics(&self) -> LayoutMetrics {
        compute_layout(self.height, self.rows.count())
    }
}
