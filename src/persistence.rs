use anyhow::{Context, Result};
#[cfg(test)]
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::constants::{paths, persisted};
use crate::geometry::{DEFAULT_GEOMETRY, Rect, WindowGeometry};

/// String key/value storage under a namespace
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    /// Write pending changes to the backing storage
    fn flush(&mut self) -> Result<()>;
}

/// Volatile store for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One TOML table of string values, `[afkoverlay]` by default
#[derive(Debug)]
pub struct TomlFileStore {
    path: PathBuf,
    namespace: String,
    document: toml::Table,
}

impl TomlFileStore {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(paths::APP_DIR);
        path.push(paths::STATE_FILENAME);
        path
    }

    /// Open the store; a missing or unreadable file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let document = match fs::read_to_string(&path) {
            Ok(contents) => contents
                .parse::<toml::Table>()
                .inspect_err(|e| {
                    error!(path = %path.display(), error = %e, "Failed to parse state file, starting empty")
                })
                .unwrap_or_default(),
            Err(_) => {
                info!(path = %path.display(), "No state file yet");
                toml::Table::new()
            }
        };
        Self {
            path,
            namespace: persisted::NAMESPACE.to_string(),
            document,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn table(&self) -> Option<&toml::Table> {
        self.document.get(&self.namespace)?.as_table()
    }
}

impl KeyValueStore for TomlFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.table()?.get(key)?.as_str().map(str::to_string)
    }

    fn set(&mut self, key: &str, value: String) {
        let entry = self
            .document
            .entry(self.namespace.clone())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if !entry.is_table() {
            warn!(namespace = %self.namespace, "State namespace was not a table, replacing it");
            *entry = toml::Value::Table(toml::Table::new());
        }
        if let Some(table) = entry.as_table_mut() {
            table.insert(key.to_string(), toml::Value::String(value));
        }
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create state directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(&self.document)
            .context("Failed to serialize state to TOML")?;
        fs::write(&self.path, contents)
            .context(format!("Failed to write state file to {}", self.path.display()))?;
        Ok(())
    }
}

/// Load the persisted geometry.
///
/// All four fields must be present and parse; otherwise the default
/// rectangle is used as a whole.
pub fn load_geometry(store: &dyn KeyValueStore) -> WindowGeometry {
    let field = |key: &str| store.get(key).and_then(|v| v.trim().parse::<i32>().ok());

    match (
        field(persisted::WINDOW_X),
        field(persisted::WINDOW_Y),
        field(persisted::WINDOW_WIDTH),
        field(persisted::WINDOW_HEIGHT),
    ) {
        (Some(x), Some(y), Some(width), Some(height)) => {
            let geometry = Rect::new(x, y, width, height);
            info!(geometry = ?geometry, "Loaded persisted overlay geometry");
            geometry
        }
        _ => {
            warn!(default = ?DEFAULT_GEOMETRY, "Persisted geometry missing or invalid, using default");
            DEFAULT_GEOMETRY
        }
    }
}

/// Write all four geometry fields and flush
pub fn save_geometry(store: &mut dyn KeyValueStore, geometry: &WindowGeometry) -> Result<()> {
    store.set(persisted::WINDOW_X, geometry.x.to_string());
    store.set(persisted::WINDOW_Y, geometry.y.to_string());
    store.set(persisted::WINDOW_WIDTH, geometry.width.to_string());
    store.set(persisted::WINDOW_HEIGHT, geometry.height.to_string());
    store
        .flush()
        .context("Failed to persist overlay geometry")?;
    info!(geometry = ?geometry, "Saved overlay geometry");
    Ok(())
}
