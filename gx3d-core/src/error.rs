/// Error types shared across the viewer
use thiserror::Error;

use crate::backend::BackendError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::model::ModelError;
use crate::settings::SettingsError;

/// Top-level viewer error
#[derive(Error, Debug)]
pub enum ViewerError {
    /// A catalog key that the catalog does not contain was selected
    #[error("unknown shape key: {0}")]
    UnknownShape(String),

    #[error("render backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
