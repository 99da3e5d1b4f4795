//! Render backend capability interface.
//!
//! The scene controller never touches a graphics API directly. It talks to
//! a [`RenderBackend`], which hands out opaque ids for every resource it
//! allocates and expects each one back through exactly one release call.

use nalgebra::Point3;
use thiserror::Error;

use crate::color::Rgb;
use crate::geometry::{Mesh, ShapeKind};
use crate::projection::{Camera, Viewport};
use crate::transform::NodeTransform;

macro_rules! resource_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u64);
        )*
    };
}

resource_id! {
    /// Root scene graph node
    SceneId,
    /// Renderer bound to one output surface
    RendererId,
    /// Tessellated geometry
    GeometryId,
    /// Surface material
    MaterialId,
    /// Node attached to a scene (mesh, light or helper)
    NodeId,
}

/// A releasable backend allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Scene(SceneId),
    Renderer(RendererId),
    Geometry(GeometryId),
    Material(MaterialId),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("unknown {kind} resource {id}")]
    UnknownResource { kind: &'static str, id: u64 },

    #[error("render surface unavailable: {0}")]
    Surface(String),

    #[error("output error: {0}")]
    Output(String),
}

impl BackendError {
    pub fn unknown(kind: &'static str, id: u64) -> Self {
        BackendError::UnknownResource { kind, id }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Output(err.to_string())
    }
}

/// Surface appearance of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialDesc {
    pub color: Rgb,
    pub wireframe: bool,
}

/// Scene illumination
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient {
        color: Rgb,
        intensity: f32,
    },
    /// Parallel light shining from `position` towards the origin
    Directional {
        color: Rgb,
        intensity: f32,
        position: Point3<f32>,
    },
}

/// Static spatial reference drawn as lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Helper {
    /// X (red), Y (green) and Z (blue) axes of the given length
    Axes { size: f32 },
    /// Square grid on the XZ plane
    Grid {
        size: f32,
        divisions: u32,
        center_color: Rgb,
        line_color: Rgb,
    },
}

/// Minimal set of operations the viewer needs from a graphics library
pub trait RenderBackend {
    fn create_scene(&mut self, background: Rgb) -> Result<SceneId, BackendError>;

    /// Create a renderer drawing into a surface of the given size
    fn create_renderer(&mut self, viewport: Viewport) -> Result<RendererId, BackendError>;

    fn set_viewport(&mut self, renderer: RendererId, viewport: Viewport) -> Result<(), BackendError>;

    fn add_light(&mut self, scene: SceneId, light: Light) -> Result<NodeId, BackendError>;

    fn add_helper(&mut self, scene: SceneId, helper: Helper) -> Result<NodeId, BackendError>;

    /// Tessellate a parametric shape
    fn create_geometry(&mut self, shape: &ShapeKind) -> Result<GeometryId, BackendError>;

    /// Upload an already tessellated mesh
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<GeometryId, BackendError>;

    fn create_material(&mut self, desc: MaterialDesc) -> Result<MaterialId, BackendError>;

    /// Change the wireframe flag in place; the backend picks it up on the next render
    fn update_material(&mut self, material: MaterialId, wireframe: bool) -> Result<(), BackendError>;

    fn add_mesh(
        &mut self,
        scene: SceneId,
        geometry: GeometryId,
        material: MaterialId,
    ) -> Result<NodeId, BackendError>;

    fn set_transform(&mut self, node: NodeId, transform: &NodeTransform) -> Result<(), BackendError>;

    fn remove_node(&mut self, scene: SceneId, node: NodeId) -> Result<(), BackendError>;

    /// Detach every node from the scene; the scene itself stays allocated
    fn clear_scene(&mut self, scene: SceneId) -> Result<(), BackendError>;

    /// Release a resource. Each id is released at most once.
    fn dispose(&mut self, resource: Resource) -> Result<(), BackendError>;

    fn render(&mut self, renderer: RendererId, scene: SceneId, camera: &Camera) -> Result<(), BackendError>;
}
