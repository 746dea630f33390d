//! Debounced idle/active classification
//!
//! The raw "is acting" signal flickers between ticks (a woodcutting animation
//! restarts, a player pauses between clicks). The character only counts as
//! idle once it has been continuously inactive for the configured threshold.

use std::time::{Duration, Instant};

/// Last instant the character was seen acting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleTimer {
    pub last_active: Instant,
}

impl IdleTimer {
    /// Timer for a session that starts at `now`
    pub fn start(now: Instant) -> Self {
        Self { last_active: now }
    }

    /// Classify one tick. Returns the idle flag and the next timer state.
    ///
    /// Acting resets the timer; time alone never does.
    pub fn classify(self, raw_acting: bool, now: Instant, threshold: Duration) -> (bool, Self) {
        if raw_acting {
            return (false, Self { last_active: now });
        }
        let elapsed = now.saturating_duration_since(self.last_active);
        (elapsed >= threshold, self)
    }
}
