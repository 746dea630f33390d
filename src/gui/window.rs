//! The always-on-top overlay window

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use eframe::{egui, CreationContext, NativeOptions};
use tracing::{debug, info};

use super::constants::*;
use super::gesture::GestureTracker;
use super::window_title;
use crate::color::palette;
use crate::constants::geometry::{MAX_HEIGHT, MAX_WIDTH, MIN_HEIGHT, MIN_WIDTH};
use crate::constants::layout::{BASE_ROW_HEIGHT, PADDING, ROW_SPACING, TITLE_BAR_HEIGHT};
use crate::event_handler::{dispatch, handle_event, reply, HandlerContext};
use crate::geometry::{Rect, ScreenLayout};
use crate::ipc::{HostLink, HostMessage, OverlayMessage, OverlayServer};
use crate::overlay::{Effect, Overlay, OverlayEvent};
use crate::persistence::KeyValueStore;
use crate::render::RenderModel;

/// What the user did in this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UiAction {
    Close,
    Minimize,
    FocusHost,
    StartMove,
    StartResize,
}

struct OverlayApp {
    overlay: Overlay,
    store: Box<dyn KeyValueStore>,
    config_path: PathBuf,
    rx: Receiver<HostMessage>,
    link: HostLink,
    gesture: GestureTracker,
    /// Screens came from the host; otherwise fall back to the monitor egui reports
    host_screens: bool,
    // Dropping it removes the socket file
    _server: OverlayServer,
}

impl OverlayApp {
    fn new(
        cc: &CreationContext<'_>,
        overlay: Overlay,
        store: Box<dyn KeyValueStore>,
        config_path: PathBuf,
        server: OverlayServer,
    ) -> Result<Self> {
        info!("Initializing overlay window");

        let (tx, rx) = mpsc::channel();
        let repaint_ctx = cc.egui_ctx.clone();
        let (link, _reader) = server.spawn_reader(tx, move || repaint_ctx.request_repaint())?;

        Ok(Self {
            overlay,
            store,
            config_path,
            rx,
            link,
            gesture: GestureTracker::default(),
            host_screens: false,
            _server: server,
        })
    }

    fn context(&mut self) -> (&mut Overlay, HandlerContext<'_>) {
        (
            &mut self.overlay,
            HandlerContext {
                store: self.store.as_mut(),
                config_path: &self.config_path,
                link: &self.link,
            },
        )
    }

    fn dispatch(&mut self, ctx: &egui::Context, event: OverlayEvent) {
        let (overlay, mut hctx) = self.context();
        let effects = dispatch(overlay, &mut hctx, event, Instant::now());
        apply_window_effects(ctx, effects);
    }

    fn drain_host_messages(&mut self, ctx: &egui::Context) {
        while let Ok(msg) = self.rx.try_recv() {
            if matches!(msg, HostMessage::ScreensChanged { .. }) {
                self.host_screens = true;
            }
            let (overlay, mut hctx) = self.context();
            let outcome = handle_event(overlay, &mut hctx, msg, Instant::now());
            apply_window_effects(ctx, outcome.window);
            if outcome.shutdown {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                return;
            }
        }
    }

    fn detect_screens(&mut self, ctx: &egui::Context) {
        if self.host_screens {
            return;
        }
        if let Some(size) = ctx.input(|i| i.viewport().monitor_size) {
            let monitor = Rect::new(0, 0, size.x.round() as i32, size.y.round() as i32);
            info!(monitor = ?monitor, "Using monitor reported by the window system");
            self.host_screens = true;
            self.dispatch(ctx, OverlayEvent::ScreensChanged(ScreenLayout::single(monitor)));
        }
    }

    /// Report window geometry to the overlay while a gesture is running
    fn track_geometry(&mut self, ctx: &egui::Context) {
        if !self.gesture.is_active() {
            return;
        }
        let Some(inner) = ctx.input(|i| i.viewport().inner_rect) else {
            return;
        };
        let current = Rect::new(
            inner.min.x.round() as i32,
            inner.min.y.round() as i32,
            inner.width().round() as i32,
            inner.height().round() as i32,
        );
        let pointer_down = ctx.input(|i| i.pointer.any_down());

        let events = self
            .gesture
            .observe(current, self.overlay.geometry(), pointer_down, Instant::now());
        for event in events {
            if matches!(event, OverlayEvent::GeometryChanged { completed: true, .. }) {
                debug!(geometry = ?current, "Window gesture finished");
            }
            self.dispatch(ctx, event);
        }

        if self.gesture.is_active() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }

    fn handle_action(&mut self, ctx: &egui::Context, action: UiAction) {
        match action {
            UiAction::Close => {
                info!("Close requested, hiding overlay");
                self.dispatch(ctx, OverlayEvent::Hide);
            }
            UiAction::Minimize => ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true)),
            UiAction::FocusHost => {
                if self.link.is_connected() {
                    reply(&self.link, &OverlayMessage::FocusHostRequested);
                } else {
                    info!("No host connected, ignoring focus request");
                }
            }
            UiAction::StartMove | UiAction::StartResize => {
                ctx.send_viewport_cmd(if action == UiAction::StartMove {
                    egui::ViewportCommand::StartDrag
                } else {
                    egui::ViewportCommand::BeginResize(egui::ResizeDirection::SouthEast)
                });
                self.gesture.start();
            }
        }
    }
}

fn apply_window_effects(ctx: &egui::Context, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Redraw => ctx.request_repaint(),
            Effect::NameChanged(name) => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Title(window_title(&name)));
                ctx.request_repaint();
            }
            Effect::MoveWindow(geometry) => {
                ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(egui::pos2(
                    geometry.x as f32,
                    geometry.y as f32,
                )));
                ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(
                    geometry.width as f32,
                    geometry.height as f32,
                )));
            }
            Effect::SetVisible(visible) => ctx.send_viewport_cmd(egui::ViewportCommand::Visible(visible)),
            other => debug!(effect = ?other, "Effect has no window counterpart"),
        }
    }
}

/// Title bar button; returns true when clicked
fn title_button(ui: &egui::Ui, painter: &egui::Painter, rect: egui::Rect, id: &str, glyph: &str) -> bool {
    let response = ui.interact(rect, ui.id().with(id), egui::Sense::click());
    if response.hovered() {
        painter.rect_filled(rect, egui::CornerRadius::same(ICON_CORNER_RADIUS), palette::BUTTON_HOVER);
    }
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        glyph,
        egui::FontId::proportional(TITLE_FONT_SIZE),
        palette::TEXT.into(),
    );
    response.clicked()
}

fn draw(ui: &egui::Ui, model: &RenderModel) -> Vec<UiAction> {
    let mut actions = Vec::new();
    let painter = ui.painter().clone();
    let full = ui.max_rect();
    let radius = egui::CornerRadius::same(CORNER_RADIUS);

    painter.rect_filled(full, radius, model.background);
    painter.rect_stroke(
        full,
        radius,
        egui::Stroke::new(BORDER_WIDTH, model.border),
        egui::StrokeKind::Inside,
    );

    // Title bar: drag handle first so the buttons sit above it
    let title = egui::Rect::from_min_size(full.min, egui::vec2(full.width(), TITLE_BAR_HEIGHT as f32));
    let title_response = ui.interact(title, ui.id().with("title"), egui::Sense::click_and_drag());
    if title_response.drag_started() {
        actions.push(UiAction::StartMove);
    }
    painter.text(
        title.left_center() + egui::vec2(PADDING as f32, 0.0),
        egui::Align2::LEFT_CENTER,
        &model.character_name,
        egui::FontId::proportional(TITLE_FONT_SIZE),
        palette::TEXT.into(),
    );

    let mut right = title.right() - TITLE_BUTTON_GAP;
    let mut next_button = || {
        let rect = egui::Rect::from_center_size(
            egui::pos2(right - TITLE_BUTTON_SIZE / 2.0, title.center().y),
            egui::Vec2::splat(TITLE_BUTTON_SIZE),
        );
        right = rect.left() - TITLE_BUTTON_GAP;
        rect
    };
    if model.chrome.show_close_button && title_button(ui, &painter, next_button(), "close", "×") {
        actions.push(UiAction::Close);
    }
    if model.chrome.show_minimize_button && title_button(ui, &painter, next_button(), "minimize", "−") {
        actions.push(UiAction::Minimize);
    }

    // Body: clicking anywhere focuses the game
    let body = egui::Rect::from_min_max(egui::pos2(full.left(), title.bottom()), full.max);
    if ui.interact(body, ui.id().with("body"), egui::Sense::click()).clicked() {
        actions.push(UiAction::FocusHost);
    }

    let row_height = (BASE_ROW_HEIGHT as f32 * model.scale_factor).max(model.icon_size);
    let font = egui::FontId::proportional(model.font_size);
    let mut y = title.bottom() + PADDING as f32;
    for row in &model.rows {
        let center_y = y + row_height / 2.0;
        let mut text_x = full.left() + PADDING as f32;
        if let Some(icon) = row.icon {
            let swatch = egui::Rect::from_min_size(
                egui::pos2(text_x, center_y - model.icon_size / 2.0),
                egui::Vec2::splat(model.icon_size),
            );
            painter.rect_filled(swatch, egui::CornerRadius::same(ICON_CORNER_RADIUS), icon.placeholder_color());
            text_x += model.icon_size + ICON_TEXT_GAP;
        }
        painter.text(
            egui::pos2(text_x, center_y),
            egui::Align2::LEFT_CENTER,
            &row.text,
            font.clone(),
            row.color.into(),
        );
        y += row_height + ROW_SPACING as f32;
    }

    // Resize grip, bottom-right
    let grip = egui::Rect::from_min_max(full.max - egui::Vec2::splat(RESIZE_GRIP_SIZE), full.max);
    let grip_response = ui.interact(grip, ui.id().with("grip"), egui::Sense::drag());
    if grip_response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeNwSe);
    }
    if grip_response.drag_started() {
        actions.push(UiAction::StartResize);
    }
    let stroke = egui::Stroke::new(BORDER_WIDTH, model.border);
    for step in [4.0, 8.0] {
        painter.line_segment(
            [
                egui::pos2(grip.right() - step, grip.bottom() - 2.0),
                egui::pos2(grip.right() - 2.0, grip.bottom() - step),
            ],
            stroke,
        );
    }

    actions
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_host_messages(ctx);
        self.detect_screens(ctx);
        self.track_geometry(ctx);

        let model = self.overlay.render();
        let actions = egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| draw(ui, &model))
            .inner;

        for action in actions {
            self.handle_action(ctx, action);
        }
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0; 4]
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Overlay exiting");
    }
}

pub fn run_gui(
    overlay: Overlay,
    store: Box<dyn KeyValueStore>,
    config_path: PathBuf,
    server: OverlayServer,
) -> Result<()> {
    let geometry = overlay.geometry();
    let title = window_title(&overlay.snapshot().character_name);

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title)
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_position([geometry.x as f32, geometry.y as f32])
            .with_inner_size([geometry.width as f32, geometry.height as f32])
            .with_min_inner_size([MIN_WIDTH as f32, MIN_HEIGHT as f32])
            .with_max_inner_size([MAX_WIDTH as f32, MAX_HEIGHT as f32]),
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |cc| Ok(Box::new(OverlayApp::new(cc, overlay, store, config_path, server)?))),
    )
    .map_err(|err| anyhow!("Failed to launch overlay window: {err}"))
}
