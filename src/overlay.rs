//! The overlay engine
//!
//! One `Overlay` owns all mutable state for a session. Each inbound event is
//! reduced synchronously into the state and answered with a list of
//! [`Effect`]s; performing them (I/O, window commands, IPC replies) is left to
//! the caller.

use std::time::Instant;
use tracing::{debug, info};

use crate::config::{keys, ConfigEffect, OverlayConfig};
use crate::geometry::{self, ScreenLayout, WindowGeometry};
use crate::highlight::{resolve_background, Background, HighlightConfig};
use crate::idle::IdleTimer;
use crate::layout::LayoutState;
use crate::render::{Chrome, RenderModel};
use crate::snapshot::{RawHostState, StatSnapshot};

/// Inbound events
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    SessionStarted,
    SessionEnded,
    Tick(RawHostState),
    ConfigChanged { key: String, value: String },
    /// Window moved or resized; `completed` once the gesture ends
    GeometryChanged { geometry: WindowGeometry, completed: bool },
    ScreensChanged(ScreenLayout),
    ResetPosition,
    Hide,
}

/// Work the caller must carry out after an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Redraw,
    /// Only the title changed
    NameChanged(String),
    /// Move/resize the native window to this rectangle
    MoveWindow(WindowGeometry),
    PersistGeometry(WindowGeometry),
    SetVisible(bool),
    /// A command toggle was handled and must be reset to false at its source
    ToggleConsumed(&'static str),
    SaveConfig,
}

#[derive(Debug)]
pub struct Overlay {
    config: OverlayConfig,
    highlight: HighlightConfig,
    snapshot: StatSnapshot,
    /// Present while a session is active
    idle_timer: Option<IdleTimer>,
    layout: LayoutState,
    geometry: WindowGeometry,
    screens: ScreenLayout,
    background: Background,
    visible: bool,
}

impl Overlay {
    /// Overlay with no known screens yet; send `ScreensChanged` to clamp
    pub fn new(config: OverlayConfig, geometry: WindowGeometry) -> Self {
        let geometry = geometry::validate(geometry, &ScreenLayout::default());
        let highlight = config.build_highlight_config();
        let snapshot = StatSnapshot::new();
        Self {
            layout: LayoutState::new(geometry.width, geometry.height, config.visible_rows()),
            background: resolve_background(&snapshot, &highlight),
            config,
            highlight,
            snapshot,
            idle_timer: None,
            geometry,
            screens: ScreenLayout::default(),
            visible: true,
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &StatSnapshot {
        &self.snapshot
    }

    pub fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    #[cfg(test)]
    pub fn layout(&self) -> &LayoutState {
        &self.layout
    }

    #[cfg(test)]
    pub fn is_session_active(&self) -> bool {
        self.idle_timer.is_some()
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn handle(&mut self, event: OverlayEvent, now: Instant) -> Vec<Effect> {
        match event {
            OverlayEvent::SessionStarted => {
                info!("Session started");
                self.snapshot = StatSnapshot::new();
                self.idle_timer = Some(IdleTimer::start(now));
                self.refresh_background();
                vec![Effect::NameChanged(String::new()), Effect::Redraw]
            }
            OverlayEvent::SessionEnded => {
                info!("Session ended");
                self.idle_timer = None;
                Vec::new()
            }
            OverlayEvent::Tick(raw) => self.on_tick(&raw, now),
            OverlayEvent::ConfigChanged { key, value } => self.on_config_changed(&key, &value),
            OverlayEvent::GeometryChanged { geometry, completed } => {
                self.on_geometry_changed(geometry, completed)
            }
            OverlayEvent::ScreensChanged(screens) => self.on_screens_changed(screens),
            OverlayEvent::ResetPosition => self.reset_position(),
            OverlayEvent::Hide => {
                self.visible = false;
                vec![Effect::SetVisible(false)]
            }
        }
    }

    fn on_tick(&mut self, raw: &RawHostState, now: Instant) -> Vec<Effect> {
        let Some(timer) = self.idle_timer else {
            debug!("Tick outside of a session, ignoring");
            return Vec::new();
        };

        let changes = self.snapshot.apply_tick(raw);

        let (idle, timer) = timer.classify(raw.activity().is_acting(), now, self.config.idle_threshold());
        self.idle_timer = Some(timer);
        if idle != self.snapshot.idle {
            info!(idle, "Idle state changed");
            self.snapshot.idle = idle;
        }

        self.refresh_background();
        debug!(
            hp = self.snapshot.current_hp,
            prayer = self.snapshot.current_prayer,
            inventory = self.snapshot.inventory_used_slots,
            idle = self.snapshot.idle,
            rule = ?self.background.rule,
            "Tick applied"
        );

        if changes.protection_changed {
            info!(protection = ?self.snapshot.active_protection, "Overhead protection changed");
        }

        let mut effects = Vec::with_capacity(2);
        if changes.name_changed {
            effects.push(Effect::NameChanged(self.snapshot.character_name.clone()));
        }
        effects.push(Effect::Redraw);
        effects
    }

    fn on_config_changed(&mut self, key: &str, value: &str) -> Vec<Effect> {
        match self.config.apply_change(key, value) {
            ConfigEffect::Layout => {
                self.layout.rows = self.config.visible_rows();
                vec![Effect::SaveConfig, Effect::Redraw]
            }
            ConfigEffect::Highlight => {
                self.highlight = self.config.build_highlight_config();
                self.refresh_background();
                vec![Effect::SaveConfig, Effect::Redraw]
            }
            ConfigEffect::Chrome => vec![Effect::SaveConfig, Effect::Redraw],
            ConfigEffect::RestoreOverlay => {
                info!("Restoring overlay visibility");
                self.visible = true;
                vec![
                    Effect::SetVisible(true),
                    Effect::ToggleConsumed(keys::RESTORE_OVERLAY),
                    Effect::Redraw,
                ]
            }
            ConfigEffect::ResetPosition => {
                let mut effects = self.reset_position();
                effects.push(Effect::ToggleConsumed(keys::RESET_POSITION));
                effects
            }
            ConfigEffect::Nothing => Vec::new(),
        }
    }

    fn on_geometry_changed(&mut self, reported: WindowGeometry, completed: bool) -> Vec<Effect> {
        if !completed {
            // Mid-gesture: follow the size for scaling, validate on release
            self.geometry = reported;
            self.resize_layout(reported);
            return vec![Effect::Redraw];
        }

        let validated = geometry::validate(reported, &self.screens);
        self.geometry = validated;
        self.resize_layout(validated);

        let mut effects = Vec::with_capacity(3);
        if validated != reported {
            effects.push(Effect::MoveWindow(validated));
        }
        effects.push(Effect::PersistGeometry(validated));
        effects.push(Effect::Redraw);
        effects
    }

    fn on_screens_changed(&mut self, screens: ScreenLayout) -> Vec<Effect> {
        info!(screens = screens.screens.len(), primary = screens.primary, "Screen layout changed");
        self.screens = screens;
        let validated = geometry::validate(self.geometry, &self.screens);
        if validated == self.geometry {
            return Vec::new();
        }
        self.geometry = validated;
        self.resize_layout(validated);
        vec![Effect::MoveWindow(validated), Effect::Redraw]
    }

    fn resize_layout(&mut self, geometry: WindowGeometry) {
        self.layout.resize(geometry.width, geometry.height);
        debug!(width = self.layout.width(), height = self.layout.height(), "Layout resized");
    }

    fn reset_position(&mut self) -> Vec<Effect> {
        let reset = geometry::reset_position(self.geometry, &self.screens);
        info!(from = ?self.geometry, to = ?reset, "Resetting overlay position");
        self.geometry = reset;
        self.resize_layout(reset);
        vec![Effect::MoveWindow(reset), Effect::PersistGeometry(reset), Effect::Redraw]
    }

    fn refresh_background(&mut self) {
        self.background = resolve_background(&self.snapshot, &self.highlight);
    }

    pub fn render(&self) -> RenderModel {
        RenderModel::build(
            &self.snapshot,
            self.background,
            self.layout.metrics(),
            self.layout.rows,
            Chrome {
                show_close_button: self.config.show_close_button,
                show_minimize_button: self.config.show_minimize_button,
            },
            self.visible,
        )
    }
}
