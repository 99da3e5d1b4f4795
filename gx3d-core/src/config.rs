/// Viewer configuration loaded from TOML
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::{Catalog, DEFAULT_SHAPE};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("initial shape `{0}` is not in the catalog")]
    UnknownInitialShape(String),

    #[error("target fps must be between 1 and 240, got {0}")]
    InvalidFrameRate(u32),
}

/// Startup options for the geometry explorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Catalog key shown on start
    pub initial_shape: String,
    /// Frames per second requested from the frame scheduler
    pub target_fps: u32,
    /// Overrides the default settings file location
    pub settings_path: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            initial_shape: DEFAULT_SHAPE.to_string(),
            target_fps: 30,
            settings_path: None,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        Ok(())
    }

    /// Check values that can only be judged against the catalog in use
    pub fn validate(&self, catalog: &Catalog) -> Result<(), ConfigError> {
        if !catalog.contains(&self.initial_shape) {
            return Err(ConfigError::UnknownInitialShape(self.initial_shape.clone()));
        }
        if !(1..=240).contains(&self.target_fps) {
            return Err(ConfigError::InvalidFrameRate(self.target_fps));
        }
        Ok(())
    }
}
