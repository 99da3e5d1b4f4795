/// GX3D Core Library - Geometry explorer scene logic
///
/// This library provides the backend-independent part of the viewer: the
/// shape catalog and tessellation, camera and transform math, the render
/// backend interface, and the scene lifecycle controller that drives it.

pub mod backend;
pub mod catalog;
pub mod color;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod host;
pub mod model;
pub mod projection;
pub mod settings;
pub mod stl;
pub mod transform;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use backend::{BackendError, RenderBackend};
pub use catalog::{Catalog, CatalogEntry};
pub use color::Rgb;
pub use config::ViewerConfig;
pub use controller::{MountStatus, SceneController, ViewState};
pub use error::{Result, ViewerError};
pub use geometry::{Mesh, ShapeKind, Triangle, Vertex};
pub use host::{FrameScheduler, HostContainer};
pub use model::{ModelAsset, ModelLibrary};
pub use projection::{Camera, Viewport};
pub use transform::{NodeTransform, RotationState, Transform};
