//! External model assets.
//!
//! A model is a mesh read from disk plus the scale it is displayed at.
//! [`ModelLibrary`] caches parsed assets by path so a viewer can preload
//! them before the first frame needs them.

use nalgebra::Vector3;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::geometry::Mesh;
use crate::stl;
use crate::transform::NodeTransform;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to read model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("model {0} contains no triangles")]
    Empty(PathBuf),
}

/// A loaded model ready to hand to a render backend
#[derive(Debug, Clone)]
pub struct ModelAsset {
    pub path: PathBuf,
    pub mesh: Arc<Mesh>,
    pub scale: f32,
}

impl ModelAsset {
    /// Display scale applied when no other is given
    pub const DEFAULT_SCALE: f32 = 1.2;

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, &data)
    }

    /// Parse an in-memory STL file; `path` is only used for reporting
    pub fn from_bytes(path: impl AsRef<Path>, data: &[u8]) -> Result<Self, ModelError> {
        let path = path.as_ref().to_path_buf();
        let mesh = stl::parse_stl(data).map_err(|reason| ModelError::Parse {
            path: path.clone(),
            reason,
        })?;
        if mesh.is_empty() {
            return Err(ModelError::Empty(path));
        }
        log::debug!("Parsed model {} ({} triangles)", path.display(), mesh.triangles.len());

        Ok(Self {
            path,
            mesh: Arc::new(mesh),
            scale: Self::DEFAULT_SCALE,
        })
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Initial node placement: unrotated, at the preset scale
    pub fn transform(&self) -> NodeTransform {
        NodeTransform::with_scale(self.scale)
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangles.len()
    }

    /// Size of the scaled model along each axis
    pub fn extent(&self) -> Vector3<f32> {
        self.mesh
            .bounding_box()
            .map(|(min, max)| (max - min) * self.scale)
            .unwrap_or_else(Vector3::zeros)
    }
}

/// Path-keyed cache of parsed models
#[derive(Debug, Default)]
pub struct ModelLibrary {
    assets: HashMap<PathBuf, ModelAsset>,
}

impl ModelLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `path` now so a later [`ModelLibrary::get`] does no IO
    pub fn preload(&mut self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        self.get(path).map(|_| ())
    }

    /// Return the cached asset, loading it on first use
    pub fn get(&mut self, path: impl AsRef<Path>) -> Result<&ModelAsset, ModelError> {
        let path = path.as_ref();
        if !self.assets.contains_key(path) {
            let asset = ModelAsset::load(path)?;
            log::info!("Loaded model {} ({} triangles)", path.display(), asset.triangle_count());
            self.assets.insert(path.to_path_buf(), asset);
        }
        self.assets
            .get(path)
            .ok_or_else(|| ModelError::Empty(path.to_path_buf()))
    }

    pub fn is_loaded(&self, path: impl AsRef<Path>) -> bool {
        self.assets.contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TETRA: &str = "solid tetra
facet normal 0 0 -1
 outer loop
  vertex 0 0 0
  vertex 0 1 0
  vertex 1 0 0
 endloop
endfacet
facet normal 0 -1 0
 outer loop
  vertex 0 0 0
  vertex 1 0 0
  vertex 0 0 1
 endloop
endfacet
endsolid tetra
";

    fn write_temp(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("gx3d-{}-{}.stl", name, std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_uses_preset_scale() {
        let asset = ModelAsset::from_bytes("tetra.stl", TETRA.as_bytes()).unwrap();
        assert_eq!(asset.triangle_count(), 2);
        assert_relative_eq!(asset.scale, ModelAsset::DEFAULT_SCALE);
        assert_relative_eq!(asset.transform().scale, 1.2);
        assert_relative_eq!(asset.with_scale(0.5).transform().scale, 0.5);
    }

    #[test]
    fn test_extent_includes_scale() {
        let asset = ModelAsset::from_bytes("tetra.stl", TETRA.as_bytes()).unwrap();
        assert_relative_eq!(asset.extent(), Vector3::new(1.2, 1.2, 1.2));
        assert_relative_eq!(asset.with_scale(2.0).extent(), Vector3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_missing_file() {
        let err = ModelAsset::load("/nonexistent/robot.stl").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn test_empty_model_is_rejected() {
        let err = ModelAsset::from_bytes("empty.stl", b"solid empty\nendsolid empty\n").unwrap_err();
        assert!(matches!(err, ModelError::Empty(_)));
    }

    #[test]
    fn test_library_preload_then_get() {
        let path = write_temp("library", TETRA.as_bytes());
        let mut library = ModelLibrary::new();
        assert!(!library.is_loaded(&path));

        library.preload(&path).unwrap();
        assert!(library.is_loaded(&path));

        // Served from the cache even after the file is gone
        fs::remove_file(&path).unwrap();
        assert_eq!(library.get(&path).unwrap().triangle_count(), 2);
        assert_eq!(library.len(), 1);
    }
}
