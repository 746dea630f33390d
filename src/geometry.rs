//! Window geometry validation against the known displays

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::geometry::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    /// Exclusive right edge, widened so persisted extremes cannot overflow
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    /// Exclusive bottom edge, widened like [`Rect::right`]
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Area shared with `other` (0 when they only touch or are apart)
    pub fn overlap_area(&self, other: &Rect) -> i64 {
        let w = self.right().min(other.right()) - i64::from(self.left().max(other.left()));
        let h = self.bottom().min(other.bottom()) - i64::from(self.top().max(other.top()));
        if w <= 0 || h <= 0 { 0 } else { w.saturating_mul(h) }
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Persisted overlay window rectangle
pub type WindowGeometry = Rect;

/// Rectangle used when nothing usable is persisted
pub const DEFAULT_GEOMETRY: WindowGeometry =
    Rect::new(DEFAULT_X, DEFAULT_Y, DEFAULT_WIDTH, DEFAULT_HEIGHT);

/// Known displays and which one is primary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenLayout {
    pub screens: Vec<Rect>,
    #[serde(default)]
    pub primary: usize,
}

impl ScreenLayout {
    pub fn new(screens: Vec<Rect>, primary: usize) -> Self {
        Self { screens, primary }
    }

    pub fn single(bounds: Rect) -> Self {
        Self::new(vec![bounds], 0)
    }

    fn primary_screen(&self) -> Option<&Rect> {
        self.screens.get(self.primary).or_else(|| self.screens.first())
    }

    /// Screen with the largest overlap, else the primary screen
    pub fn screen_for(&self, geometry: &Rect) -> Option<&Rect> {
        let mut best: Option<(&Rect, i64)> = None;
        for screen in &self.screens {
            let area = geometry.overlap_area(screen);
            if area > 0 && best.is_none_or(|(_, best_area)| area > best_area) {
                best = Some((screen, area));
            }
        }
        best.map(|(screen, _)| screen).or_else(|| self.primary_screen())
    }
}

/// Bound the size, then shift the rectangle onto its screen.
///
/// Right/bottom overflow is corrected before left/top underflow, so a window
/// larger than its screen ends up pinned to the screen's top-left corner.
/// The result is a fixed point: validating it again returns it unchanged.
pub fn validate(geometry: WindowGeometry, screens: &ScreenLayout) -> WindowGeometry {
    let mut rect = Rect {
        width: geometry.width.clamp(MIN_WIDTH, MAX_WIDTH),
        height: geometry.height.clamp(MIN_HEIGHT, MAX_HEIGHT),
        ..geometry
    };

    let Some(screen) = screens.screen_for(&rect) else {
        debug!(geometry = ?rect, "No screens known, only bounding size");
        return rect;
    };

    if rect.right() > screen.right() {
        rect.x = saturate(screen.right() - i64::from(rect.width));
    }
    if rect.bottom() > screen.bottom() {
        rect.y = saturate(screen.bottom() - i64::from(rect.height));
    }
    if rect.left() < screen.left() {
        rect.x = screen.left();
    }
    if rect.top() < screen.top() {
        rect.y = screen.top();
    }

    if rect != geometry {
        info!(from = ?geometry, to = ?rect, screen = ?screen, "Clamped overlay geometry");
    }
    rect
}

/// Default location with the current size, validated
pub fn reset_position(current: WindowGeometry, screens: &ScreenLayout) -> WindowGeometry {
    validate(
        Rect {
            x: DEFAULT_X,
            y: DEFAULT_Y,
            ..current
        },
        screens,
    )
}
