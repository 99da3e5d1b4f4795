//! Persisted display preferences.
//!
//! The viewer keeps two boolean flags across sessions, `wireframe` and
//! `autoRotate`, in a string key-value store. Values are written as
//! `"true"`/`"false"`; anything unreadable falls back to the defaults.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const WIREFRAME_KEY: &str = "wireframe";
pub const AUTO_ROTATE_KEY: &str = "autoRotate";

const SETTINGS_DIR: &str = "gx3d";
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to write settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// String-keyed persistent storage
pub trait SettingsStore {
    fn load(&self, key: &str) -> Option<String>;
    fn store(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// The persisted subset of the view state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSettings {
    pub wireframe: bool,
    pub auto_rotate: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            wireframe: false,
            auto_rotate: true,
        }
    }
}

impl ViewSettings {
    /// Read both flags; wireframe is on only for an exact `"true"`,
    /// auto-rotate is off only for an exact `"false"`.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let wireframe = store.load(WIREFRAME_KEY).as_deref() == Some("true");
        let auto_rotate = store.load(AUTO_ROTATE_KEY).as_deref() != Some("false");
        Self {
            wireframe,
            auto_rotate,
        }
    }

    pub fn save_wireframe(&self, store: &mut dyn SettingsStore) -> Result<(), SettingsError> {
        store.store(WIREFRAME_KEY, bool_str(self.wireframe))
    }

    pub fn save_auto_rotate(&self, store: &mut dyn SettingsStore) -> Result<(), SettingsError> {
        store.store(AUTO_ROTATE_KEY, bool_str(self.auto_rotate))
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// In-memory store, for tests and sessions that should not persist
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A flat TOML table of strings on disk.
///
/// The file is read once at open; a missing or unparsable file reads as
/// empty. Every `store` rewrites the whole table.
#[derive(Debug)]
pub struct TomlFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl TomlFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<toml::Table>(&text) {
                Ok(table) => scalar_strings(table),
                Err(e) => {
                    log::warn!("Ignoring unreadable settings file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        log::debug!("Opened settings store {} ({} keys)", path.display(), values.len());
        Self { path, values }
    }

    /// `<config dir>/gx3d/settings.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = toml::to_string(&self.values)?;
        fs::write(&self.path, text).map_err(io_err)
    }
}

/// Keep scalar entries as their string form, so a hand-edited
/// `wireframe = true` reads the same as `wireframe = "true"`
fn scalar_strings(table: toml::Table) -> BTreeMap<String, String> {
    table
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                toml::Value::String(text) => text,
                toml::Value::Boolean(flag) => flag.to_string(),
                toml::Value::Integer(n) => n.to_string(),
                toml::Value::Float(n) => n.to_string(),
                other => {
                    log::warn!("Ignoring non-scalar setting {} = {}", key, other);
                    return None;
                }
            };
            Some((key, text))
        })
        .collect()
}

impl SettingsStore for TomlFileStore {
    fn load(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }
}
