//! IPC (Inter-Process Communication) via Unix sockets
//!
//! The game host connects to the overlay's socket and streams
//! [`HostMessage`]s; the overlay answers with [`OverlayMessage`]s on the same
//! connection. Uses length-prefixed JSON over Unix domain sockets.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::constants::ipc::MAX_MESSAGE_SIZE;
use crate::constants::paths;

mod messages;
pub use messages::{HostMessage, OverlayMessage};

/// Get default socket path (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_socket_path() -> Result<PathBuf> {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir)
            .join(paths::APP_DIR)
            .join(paths::SOCKET_FILENAME));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(paths::APP_DIR).join(paths::SOCKET_FILENAME))
}

/// Write half of the currently connected host, shared with the reader thread
#[derive(Clone, Default)]
pub struct HostLink {
    writer: Arc<Mutex<Option<UnixStream>>>,
}

impl HostLink {
    pub fn is_connected(&self) -> bool {
        self.writer.lock().map(|w| w.is_some()).unwrap_or(false)
    }

    /// Send to the host; dropped with a debug log when nobody is connected
    pub fn send(&self, msg: &OverlayMessage) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("Host link lock poisoned"))?;
        match writer.as_mut() {
            Some(stream) => write_message(stream, msg),
            None => {
                debug!(message = ?msg, "No host connected, dropping message");
                Ok(())
            }
        }
    }

    fn attach(&self, stream: UnixStream) {
        if let Ok(mut writer) = self.writer.lock() {
            *writer = Some(stream);
        }
    }

    fn detach(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            *writer = None;
        }
    }
}

/// Listening socket owned by the overlay
pub struct OverlayServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl OverlayServer {
    pub fn bind() -> Result<Self> {
        let socket_path = default_socket_path()?;
        Self::bind_to(socket_path)
    }

    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create socket directory: {}", parent.display()))?;
        }

        // Remove stale socket if exists
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .context(format!("Failed to remove stale socket: {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .context(format!("Failed to bind socket at {}", socket_path.display()))?;

        // Owner only
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        info!(path = %socket_path.display(), "Listening for host connections");
        Ok(Self {
            listener,
            socket_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.socket_path
    }

    /// Spawn the reader thread.
    ///
    /// Hosts are served one at a time. Every decoded message is forwarded on
    /// `tx` and followed by a call to `wake` so the UI loop picks it up. The
    /// thread exits once the receiving side of `tx` is gone.
    pub fn spawn_reader<W>(&self, tx: Sender<HostMessage>, wake: W) -> Result<(HostLink, JoinHandle<()>)>
    where
        W: Fn() + Send + 'static,
    {
        let listener = self
            .listener
            .try_clone()
            .context("Failed to clone IPC listener")?;
        let link = HostLink::default();
        let thread_link = link.clone();

        let handle = thread::Builder::new()
            .name("ipc-reader".to_string())
            .spawn(move || {
                for incoming in listener.incoming() {
                    let mut stream = match incoming {
                        Ok(stream) => stream,
                        Err(e) => {
                            error!(error = %e, "Failed to accept IPC connection");
                            continue;
                        }
                    };

                    match stream.try_clone() {
                        Ok(writer) => thread_link.attach(writer),
                        Err(e) => warn!(error = %e, "Failed to clone host stream, replies disabled"),
                    }
                    info!("Host connected");

                    let keep_running = serve_host(&mut stream, &tx, &wake);
                    thread_link.detach();
                    info!("Host disconnected");

                    if !keep_running {
                        debug!("Message receiver dropped, IPC reader exiting");
                        return;
                    }
                }
            })
            .context("Failed to spawn IPC reader thread")?;

        Ok((link, handle))
    }
}

impl Drop for OverlayServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Forward messages from one host until it disconnects.
///
/// Returns false when the receiver is gone and the reader should stop.
fn serve_host<W: Fn()>(stream: &mut UnixStream, tx: &Sender<HostMessage>, wake: &W) -> bool {
    loop {
        let msg = match read_message::<HostMessage, _>(stream) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = ?e, "Host stream closed");
                return true;
            }
        };
        let shutdown = msg == HostMessage::Shutdown;
        if tx.send(msg).is_err() {
            return false;
        }
        wake();
        if shutdown {
            return true;
        }
    }
}

/// Write length-prefixed message to stream
fn write_message<T: Serialize, S: Write>(stream: &mut S, msg: &T) -> Result<()> {
    let json = serde_json::to_vec(msg).context("Failed to serialize message to JSON")?;

    // Write length prefix (u32 little-endian)
    let len = json.len() as u32;
    stream
        .write_all(&len.to_le_bytes())
        .context("Failed to write message length")?;

    stream
        .write_all(&json)
        .context("Failed to write message payload")?;

    stream.flush().context("Failed to flush stream")?;

    Ok(())
}

/// Read length-prefixed message from stream
fn read_message<T: for<'de> Deserialize<'de>, S: Read>(stream: &mut S) -> Result<T> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .context("Failed to read message length")?;
    let len = u32::from_le_bytes(len_buf) as usize;

    // Sanity check (prevent DoS via huge allocation)
    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", len, MAX_MESSAGE_SIZE));
    }

    let mut json_buf = vec![0u8; len];
    stream
        .read_exact(&mut json_buf)
        .context("Failed to read message payload")?;

    serde_json::from_slice(&json_buf).context("Failed to deserialize message from JSON")
}
