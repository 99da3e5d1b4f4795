/// Catalog of selectable shapes
use std::collections::HashSet;
use thiserror::Error;

use crate::color::Rgb;
use crate::geometry::ShapeKind;

/// Key selected when nothing else is configured
pub const DEFAULT_SHAPE: &str = "cube";

#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("duplicate catalog key: {0}")]
    DuplicateKey(String),

    #[error("catalog has no entries")]
    Empty,
}

/// A named recipe for one displayable shape
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub key: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub color: Rgb,
    pub factory: fn() -> ShapeKind,
}

impl CatalogEntry {
    /// Produce a fresh shape description
    pub fn create(&self) -> ShapeKind {
        (self.factory)()
    }
}

/// Ordered, immutable set of catalog entries with unique keys
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.key) {
                return Err(CatalogError::DuplicateKey(entry.key.to_string()));
            }
        }
        Ok(Self { entries })
    }

    /// The built-in primitive catalog
    pub fn standard() -> Self {
        Self {
            entries: standard_entries(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Position of `key` in display order
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key == key)
    }

    pub fn entry_at(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

const PRIMITIVES: &str = "Primitives";

fn standard_entries() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            key: "cube",
            name: "Cube",
            category: PRIMITIVES,
            description: "Cube",
            color: Rgb::from_hex(0x44aa88),
            factory: || ShapeKind::Box {
                width: 1.5,
                height: 1.5,
                depth: 1.5,
            },
        },
        CatalogEntry {
            key: "sphere",
            name: "Sphere",
            category: PRIMITIVES,
            description: "Sphere",
            color: Rgb::from_hex(0xff6b6b),
            factory: || ShapeKind::Sphere {
                radius: 1.0,
                width_segments: 32,
                height_segments: 16,
            },
        },
        CatalogEntry {
            key: "plane",
            name: "Plane",
            category: PRIMITIVES,
            description: "Plane",
            color: Rgb::from_hex(0x6bcb77),
            factory: || ShapeKind::Plane {
                width: 2.0,
                height: 2.0,
            },
        },
        CatalogEntry {
            key: "cone",
            name: "Cone",
            category: PRIMITIVES,
            description: "Cone",
            color: Rgb::from_hex(0xffd93d),
            factory: || ShapeKind::Cone {
                radius: 1.0,
                height: 2.0,
                radial_segments: 32,
            },
        },
        CatalogEntry {
            key: "cylinder",
            name: "Cylinder",
            category: PRIMITIVES,
            description: "Cylinder",
            color: Rgb::from_hex(0x4d96ff),
            factory: || ShapeKind::Cylinder {
                radius_top: 1.0,
                radius_bottom: 1.0,
                height: 2.0,
                radial_segments: 32,
            },
        },
        CatalogEntry {
            key: "torus",
            name: "Torus",
            category: PRIMITIVES,
            description: "Torus",
            color: Rgb::from_hex(0xff6b6b),
            factory: || ShapeKind::Torus {
                radius: 1.0,
                tube: 0.3,
                radial_segments: 16,
                tubular_segments: 100,
            },
        },
        CatalogEntry {
            key: "knot",
            name: "Torus Knot",
            category: PRIMITIVES,
            description: "Torus knot",
            color: Rgb::from_hex(0x845ec2),
            factory: || ShapeKind::TorusKnot {
                radius: 1.0,
                tube: 0.3,
                tubular_segments: 100,
                radial_segments: 16,
                p: 2,
                q: 3,
            },
        },
        CatalogEntry {
            key: "circle",
            name: "Circle",
            category: PRIMITIVES,
            description: "Circle",
            color: Rgb::from_hex(0xff9671),
            factory: || ShapeKind::Circle {
                radius: 1.0,
                segments: 32,
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_order() {
        let catalog = Catalog::standard();
        let keys: Vec<_> = catalog.iter().map(|entry| entry.key).collect();
        assert_eq!(
            keys,
            ["cube", "sphere", "plane", "cone", "cylinder", "torus", "knot", "circle"]
        );
        assert!(catalog.contains(DEFAULT_SHAPE));
        assert_eq!(catalog.index_of("knot"), Some(6));
    }

    #[test]
    fn test_factory_builds_matching_shape() {
        let catalog = Catalog::standard();
        let cube = catalog.get("cube").unwrap();
        assert!(matches!(cube.create(), ShapeKind::Box { width, .. } if width == 1.5));
        assert_eq!(cube.color, Rgb::parse("#44aa88").unwrap());
        assert!(catalog.get("dodecahedron").is_none());
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let mut entries = standard_entries();
        entries.push(entries[0].clone());
        assert_eq!(
            Catalog::new(entries).unwrap_err(),
            CatalogError::DuplicateKey("cube".into())
        );
        assert_eq!(Catalog::new(Vec::new()).unwrap_err(), CatalogError::Empty);
    }
}
