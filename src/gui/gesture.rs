//! Turns a native window move/resize into geometry events for the overlay

use std::time::{Duration, Instant};

use super::constants::GESTURE_SETTLE_MS;
use crate::geometry::Rect;
use crate::overlay::OverlayEvent;

/// Follows the window between drag start and pointer release.
///
/// Native drags may swallow the release, so a pause of `GESTURE_SETTLE_MS`
/// also completes the gesture. Tracking continues after such a pause, and a
/// resumed drag completes again with its final geometry.
#[derive(Debug, Default)]
pub struct GestureTracker {
    armed: bool,
    /// Last unreported change
    pending_since: Option<Instant>,
}

impl GestureTracker {
    pub fn start(&mut self) {
        self.armed = true;
        self.pending_since = None;
    }

    pub fn is_active(&self) -> bool {
        self.armed
    }

    /// Compare the window's current geometry with what the overlay knows
    pub fn observe(&mut self, current: Rect, known: Rect, pointer_down: bool, now: Instant) -> Vec<OverlayEvent> {
        if !self.armed {
            return Vec::new();
        }

        let mut events = Vec::new();
        if current != known {
            self.pending_since = Some(now);
            events.push(OverlayEvent::GeometryChanged {
                geometry: current,
                completed: false,
            });
        }

        let settle = Duration::from_millis(GESTURE_SETTLE_MS);
        if let Some(since) = self.pending_since
            && (!pointer_down || now.duration_since(since) >= settle)
        {
            self.pending_since = None;
            events.push(OverlayEvent::GeometryChanged {
                geometry: current,
                completed: true,
            });
        }

        if !pointer_down {
            self.armed = false;
        }
        events
    }
}
