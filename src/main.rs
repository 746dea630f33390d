#![forbid(unsafe_code)]

mod color;
mod config;
mod constants;
mod event_handler;
mod geometry;
mod gui;
mod highlight;
mod idle;
mod ipc;
mod layout;
mod overlay;
mod persistence;
mod render;
mod snapshot;

use anyhow::{Context, Result};
use clap::Parser;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use config::OverlayConfig;
use event_handler::{dispatch, handle_event, HandlerContext};
use ipc::{HostLink, OverlayServer};
use overlay::{Overlay, OverlayEvent};
use persistence::{load_geometry, KeyValueStore, TomlFileStore};
use render::RenderModel;

/// How often the headless loop checks for termination signals
const HEADLESS_POLL: Duration = Duration::from_millis(250);

/// Always-on-top status overlay for an AFK game character
#[derive(Parser, Debug)]
#[command(name = "afk-overlay", version, about, long_about = None)]
struct Cli {
    /// Run without a window, logging every frame instead
    #[arg(long)]
    headless: bool,

    /// Unix socket path the game host connects to
    #[arg(short = 's', long, value_name = "PATH")]
    socket: Option<PathBuf>,

    /// Move the overlay back to its default position on startup
    #[arg(long)]
    reset_position: bool,
}

fn init_tracing() -> Result<()> {
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to install tracing subscriber")
}

fn log_frame(model: &RenderModel) {
    match serde_json::to_string(model) {
        Ok(json) => info!(frame = %json, "Frame"),
        Err(e) => error!(error = %e, "Failed to serialize frame"),
    }
}

fn run_headless(
    mut overlay: Overlay,
    mut store: Box<dyn KeyValueStore>,
    config_path: PathBuf,
    server: OverlayServer,
) -> Result<()> {
    let term = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&term))
            .context(format!("Failed to register handler for signal {signal}"))?;
    }

    let (tx, rx) = mpsc::channel();
    let (link, _reader) = server.spawn_reader(tx, || {})?;
    info!(socket = %server.path().display(), "Running headless, waiting for host");

    while !term.load(Ordering::Relaxed) {
        let msg = match rx.recv_timeout(HEADLESS_POLL) {
            Ok(msg) => msg,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                error!("IPC reader stopped");
                break;
            }
        };

        let mut ctx = HandlerContext {
            store: store.as_mut(),
            config_path: &config_path,
            link: &link,
        };
        let outcome = handle_event(&mut overlay, &mut ctx, msg, Instant::now());
        if !outcome.window.is_empty() {
            debug!(effects = ?outcome.window, "Window effects");
            log_frame(&overlay.render());
        }
        if outcome.shutdown {
            break;
        }
    }

    info!("Headless overlay exiting");
    Ok(())
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config_path = OverlayConfig::default_path();
    let config = OverlayConfig::load_from(&config_path);
    debug!(config = ?config, "Effective config");

    let state = TomlFileStore::open(TomlFileStore::default_path());
    info!(path = %state.path().display(), "Window state file");
    let mut store: Box<dyn KeyValueStore> = Box::new(state);
    let mut overlay = Overlay::new(config, load_geometry(store.as_ref()));

    if cli.reset_position {
        let link = HostLink::default();
        let mut ctx = HandlerContext {
            store: store.as_mut(),
            config_path: &config_path,
            link: &link,
        };
        dispatch(&mut overlay, &mut ctx, OverlayEvent::ResetPosition, Instant::now());
    }

    let server = match cli.socket {
        Some(path) => OverlayServer::bind_to(path),
        None => OverlayServer::bind(),
    }
    .context("Failed to start IPC server")?;

    if cli.headless {
        run_headless(overlay, store, config_path, server)
    } else {
        gui::run_gui(overlay, store, config_path, server)
    }
}
