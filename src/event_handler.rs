//! Glue between host messages, the overlay engine and the outside world

use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::geometry::ScreenLayout;
use crate::ipc::{HostLink, HostMessage, OverlayMessage};
use crate::overlay::{Effect, Overlay, OverlayEvent};
use crate::persistence::{save_geometry, KeyValueStore};

/// Where effects that need I/O are carried out
pub struct HandlerContext<'a> {
    pub store: &'a mut dyn KeyValueStore,
    pub config_path: &'a Path,
    pub link: &'a HostLink,
}

/// Result of one host message
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Effects only the window can perform (redraw, move, show/hide)
    pub window: Vec<Effect>,
    pub shutdown: bool,
}

pub fn handle_event(overlay: &mut Overlay, ctx: &mut HandlerContext<'_>, msg: HostMessage, now: Instant) -> Outcome {
    let event = match msg {
        HostMessage::Ping => {
            reply(ctx.link, &OverlayMessage::Pong);
            return Outcome::default();
        }
        HostMessage::Shutdown => {
            info!("Shutdown requested by host");
            return Outcome {
                window: Vec::new(),
                shutdown: true,
            };
        }
        HostMessage::SessionStarted => OverlayEvent::SessionStarted,
        HostMessage::SessionEnded => OverlayEvent::SessionEnded,
        HostMessage::Tick(raw) => OverlayEvent::Tick(raw),
        HostMessage::ConfigChanged { key, value } => OverlayEvent::ConfigChanged { key, value },
        HostMessage::ScreensChanged { screens, primary } => {
            OverlayEvent::ScreensChanged(ScreenLayout::new(screens, primary))
        }
    };

    Outcome {
        window: dispatch(overlay, ctx, event, now),
        shutdown: false,
    }
}

/// Feed one event to the overlay and perform its I/O effects.
///
/// Returns the effects left for the window.
pub fn dispatch(overlay: &mut Overlay, ctx: &mut HandlerContext<'_>, event: OverlayEvent, now: Instant) -> Vec<Effect> {
    let effects = overlay.handle(event, now);
    perform_effects(overlay, ctx, effects)
}

fn perform_effects(overlay: &Overlay, ctx: &mut HandlerContext<'_>, effects: Vec<Effect>) -> Vec<Effect> {
    let mut window = Vec::new();
    for effect in effects {
        match effect {
            Effect::PersistGeometry(geometry) => {
                if let Err(e) = save_geometry(ctx.store, &geometry) {
                    error!(error = ?e, "Failed to persist geometry");
                    reply(ctx.link, &OverlayMessage::Error(format!("{e:#}")));
                }
            }
            Effect::SaveConfig => {
                if let Err(e) = overlay.config().save_to(ctx.config_path) {
                    error!(error = ?e, "Failed to save config");
                    reply(ctx.link, &OverlayMessage::Error(format!("{e:#}")));
                }
            }
            Effect::ToggleConsumed(key) => {
                debug!(key, "Toggle consumed, resetting at host");
                reply(
                    ctx.link,
                    &OverlayMessage::ToggleConsumed {
                        key: key.to_string(),
                    },
                );
            }
            other => window.push(other),
        }
    }
    window
}

pub fn reply(link: &HostLink, msg: &OverlayMessage) {
    let _ = link
        .send(msg)
        .inspect_err(|e| error!(error = ?e, message = ?msg, "Failed to send message to host"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{keys, OverlayConfig};
    use crate::constants::{paths, persisted};
    use crate::geometry::Rect;
    use crate::persistence::{load_geometry, MemoryStore};
    use crate::snapshot::RawHostState;

    fn overlay() -> Overlay {
        Overlay::new(OverlayConfig::default(), Rect::new(100, 100, 300, 180))
    }

    #[test]
    fn test_tick_before_session_has_no_effects() {
        let mut overlay = overlay();
        let mut store = MemoryStore::new();
        let link = HostLink::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(paths::CONFIG_FILENAME);
        let mut ctx = HandlerContext {
            store: &mut store,
            config_path: &path,
            link: &link,
        };

        let outcome = handle_event(
            &mut overlay,
            &mut ctx,
            HostMessage::Tick(RawHostState {
                current_hp: 10,
                max_hp: 10,
                ..Default::default()
            }),
            Instant::now(),
        );
        assert_eq!(outcome, Outcome::default());
    }

    #[test]
    fn test_shutdown_and_ping() {
        let mut overlay = overlay();
        let mut store = MemoryStore::new();
        let link = HostLink::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(paths::CONFIG_FILENAME);
        let mut ctx = HandlerContext {
            store: &mut store,
            config_path: &path,
            link: &link,
        };

        assert!(!handle_event(&mut overlay, &mut ctx, HostMessage::Ping, Instant::now()).shutdown);
        assert!(handle_event(&mut overlay, &mut ctx, HostMessage::Shutdown, Instant::now()).shutdown);
    }

    #[test]
    fn test_completed_resize_is_persisted() {
        let mut overlay = overlay();
        let mut store = MemoryStore::new();
        let link = HostLink::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(paths::CONFIG_FILENAME);
        let now = Instant::now();
        {
            let mut ctx = HandlerContext {
                store: &mut store,
                config_path: &path,
                link: &link,
            };
            handle_event(
                &mut overlay,
                &mut ctx,
                HostMessage::ScreensChanged {
                    screens: vec![Rect::new(0, 0, 1920, 1080)],
                    primary: 0,
                },
                now,
            );
            let window = dispatch(
                &mut overlay,
                &mut ctx,
                OverlayEvent::GeometryChanged {
                    geometry: Rect::new(200, 150, 260, 200),
                    completed: true,
                },
                now,
            );
            assert_eq!(window, vec![Effect::Redraw]);
        }

        assert_eq!(store.get(persisted::WINDOW_HEIGHT).as_deref(), Some("200"));
        assert_eq!(load_geometry(&store), Rect::new(200, 150, 260, 200));
    }

    #[test]
    fn test_restore_toggle_shows_window_and_saves_nothing() {
        let mut overlay = overlay();
        let mut store = MemoryStore::new();
        let link = HostLink::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(paths::CONFIG_FILENAME);
        let now = Instant::now();
        let mut ctx = HandlerContext {
            store: &mut store,
            config_path: &path,
            link: &link,
        };

        dispatch(&mut overlay, &mut ctx, OverlayEvent::Hide, now);
        let outcome = handle_event(
            &mut overlay,
            &mut ctx,
            HostMessage::ConfigChanged {
                key: keys::RESTORE_OVERLAY.to_string(),
                value: "true".to_string(),
            },
            now,
        );
        assert_eq!(outcome.window, vec![Effect::SetVisible(true), Effect::Redraw]);
        assert!(!path.exists());
    }

    #[test]
    fn test_config_change_writes_file() {
        let mut overlay = overlay();
        let mut store = MemoryStore::new();
        let link = HostLink::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(paths::CONFIG_FILENAME);
        let mut ctx = HandlerContext {
            store: &mut store,
            config_path: &path,
            link: &link,
        };

        handle_event(
            &mut overlay,
            &mut ctx,
            HostMessage::ConfigChanged {
                key: keys::SHOW_STATUS.to_string(),
                value: "false".to_string(),
            },
            Instant::now(),
        );

        let saved = OverlayConfig::load_from(&path);
        assert!(!saved.show_status);
    }
}
