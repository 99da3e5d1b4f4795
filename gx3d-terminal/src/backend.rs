//! Terminal implementation of the render backend.
//!
//! Resources live in id-keyed tables. Rendering rasterises the scene into
//! the renderer's [`AsciiRenderer`] and writes the frame to the output at
//! the surface origin.

use gx3d_core::backend::{
    BackendError, GeometryId, Helper, Light, MaterialDesc, MaterialId, NodeId, RenderBackend,
    RendererId, Resource, SceneId,
};
use gx3d_core::{Camera, Mesh, NodeTransform, Rgb, ShapeKind, Viewport};
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::io::Write;

use crate::renderer::{AsciiRenderer, Shading, SurfaceStyle};

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: f32 = 2.0;

const AXIS_COLORS: [Rgb; 3] = [
    Rgb::from_hex(0xff0000),
    Rgb::from_hex(0x00ff00),
    Rgb::from_hex(0x0000ff),
];

#[derive(Debug)]
struct SceneData {
    background: Rgb,
    nodes: Vec<NodeId>,
}

#[derive(Debug)]
struct MaterialState {
    desc: MaterialDesc,
    dirty: bool,
}

#[derive(Debug)]
enum NodeContent {
    Light(Light),
    Helper(Helper),
    Mesh {
        geometry: GeometryId,
        material: MaterialId,
        transform: NodeTransform,
    },
}

pub struct TerminalBackend<W: Write> {
    out: W,
    origin: (u16, u16),
    next_id: u64,
    scenes: HashMap<SceneId, SceneData>,
    renderers: HashMap<RendererId, AsciiRenderer>,
    geometries: HashMap<GeometryId, Mesh>,
    materials: HashMap<MaterialId, MaterialState>,
    nodes: HashMap<NodeId, NodeContent>,
}

impl<W: Write> TerminalBackend<W> {
    /// Frames are written to `out` with their top-left corner at `origin`
    pub fn new(out: W, origin: (u16, u16)) -> Self {
        Self {
            out,
            origin,
            next_id: 0,
            scenes: HashMap::new(),
            renderers: HashMap::new(),
            geometries: HashMap::new(),
            materials: HashMap::new(),
            nodes: HashMap::new(),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Outstanding scenes, renderers, geometries and materials
    pub fn live_resources(&self) -> usize {
        self.scenes.len() + self.renderers.len() + self.geometries.len() + self.materials.len()
    }

    pub fn renderer(&self, id: RendererId) -> Option<&AsciiRenderer> {
        self.renderers.get(&id)
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    fn attach(&mut self, scene: SceneId, content: NodeContent) -> Result<NodeId, BackendError> {
        let node = NodeId(self.next_id());
        let data = self
            .scenes
            .get_mut(&scene)
            .ok_or_else(|| BackendError::unknown("scene", scene.0))?;
        data.nodes.push(node);
        self.nodes.insert(node, content);
        Ok(node)
    }

    fn shading(&self, scene: &SceneData) -> Shading {
        let mut shading = Shading::default();
        for content in scene.nodes.iter().filter_map(|id| self.nodes.get(id)) {
            match content {
                NodeContent::Light(Light::Ambient { color, intensity }) => {
                    shading.ambient += intensity * color.luminance();
                }
                NodeContent::Light(Light::Directional {
                    color,
                    intensity,
                    position,
                }) => {
                    if let Some(dir) = position.coords.try_normalize(1e-6) {
                        shading.directional.push((dir, intensity * color.luminance()));
                    }
                }
                _ => {}
            }
        }
        shading
    }
}

fn draw_helper(
    renderer: &mut AsciiRenderer,
    helper: &Helper,
    view_projection: &nalgebra::Matrix4<f32>,
) {
    match *helper {
        Helper::Axes { size } => {
            let origin = Point3::origin();
            for (axis, color) in [Vector3::x(), Vector3::y(), Vector3::z()]
                .into_iter()
                .zip(AXIS_COLORS)
            {
                renderer.draw_segment(view_projection, &origin, &Point3::from(axis * size), color);
            }
        }
        Helper::Grid {
            size,
            divisions,
            center_color,
            line_color,
        } => {
            let divisions = divisions.max(1);
            let half = size / 2.0;
            let step = size / divisions as f32;
            for i in 0..=divisions {
                let k = -half + step * i as f32;
                let color = if i * 2 == divisions { center_color } else { line_color };
                renderer.draw_segment(
                    view_projection,
                    &Point3::new(k, 0.0, -half),
                    &Point3::new(k, 0.0, half),
                    color,
                );
                renderer.draw_segment(
                    view_projection,
                    &Point3::new(-half, 0.0, k),
                    &Point3::new(half, 0.0, k),
                    color,
                );
            }
        }
    }
}

impl<W: Write> RenderBackend for TerminalBackend<W> {
    fn create_scene(&mut self, background: Rgb) -> Result<SceneId, BackendError> {
        let scene = SceneId(self.next_id());
        self.scenes.insert(
            scene,
            SceneData {
                background,
                nodes: Vec::new(),
            },
        );
        Ok(scene)
    }

    fn create_renderer(&mut self, viewport: Viewport) -> Result<RendererId, BackendError> {
        if viewport.is_empty() {
            return Err(BackendError::Surface(format!(
                "cannot render into a {}x{} surface",
                viewport.width, viewport.height
            )));
        }
        let renderer = RendererId(self.next_id());
        self.renderers.insert(
            renderer,
            AsciiRenderer::new(viewport.width as usize, viewport.height as usize),
        );
        log::debug!("Created terminal renderer {}x{}", viewport.width, viewport.height);
        Ok(renderer)
    }

    fn set_viewport(&mut self, renderer: RendererId, viewport: Viewport) -> Result<(), BackendError> {
        let target = self
            .renderers
            .get_mut(&renderer)
            .ok_or_else(|| BackendError::unknown("renderer", renderer.0))?;
        target.resize(viewport.width as usize, viewport.height as usize);
        Ok(())
    }

    fn add_light(&mut self, scene: SceneId, light: Light) -> Result<NodeId, BackendError> {
        self.attach(scene, NodeContent::Light(light))
    }

    fn add_helper(&mut self, scene: SceneId, helper: Helper) -> Result<NodeId, BackendError> {
        self.attach(scene, NodeContent::Helper(helper))
    }

    fn create_geometry(&mut self, shape: &ShapeKind) -> Result<GeometryId, BackendError> {
        let mesh = Mesh::from_shape(shape);
        log::debug!("Tessellated {} into {} triangles", shape.name(), mesh.triangles.len());
        let geometry = GeometryId(self.next_id());
        self.geometries.insert(geometry, mesh);
        Ok(geometry)
    }

    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<GeometryId, BackendError> {
        let geometry = GeometryId(self.next_id());
        self.geometries.insert(geometry, mesh.clone());
        Ok(geometry)
    }

    fn create_material(&mut self, desc: MaterialDesc) -> Result<MaterialId, BackendError> {
        let material = MaterialId(self.next_id());
        self.materials.insert(material, MaterialState { desc, dirty: false });
        Ok(material)
    }

    fn update_material(&mut self, material: MaterialId, wireframe: bool) -> Result<(), BackendError> {
        let state = self
            .materials
            .get_mut(&material)
            .ok_or_else(|| BackendError::unknown("material", material.0))?;
        state.desc.wireframe = wireframe;
        state.dirty = true;
        Ok(())
    }

    fn add_mesh(
        &mut self,
        scene: SceneId,
        geometry: GeometryId,
        material: MaterialId,
    ) -> Result<NodeId, BackendError> {
        if !self.geometries.contains_key(&geometry) {
            return Err(BackendError::unknown("geometry", geometry.0));
        }
        if !self.materials.contains_key(&material) {
            return Err(BackendError::unknown("material", material.0));
        }
        self.attach(
            scene,
            NodeContent::Mesh {
                geometry,
                material,
                transform: NodeTransform::default(),
            },
        )
    }

    fn set_transform(&mut self, node: NodeId, transform: &NodeTransform) -> Result<(), BackendError> {
        match self.nodes.get_mut(&node) {
            Some(NodeContent::Mesh { transform: current, .. }) => {
                *current = *transform;
                Ok(())
            }
            _ => Err(BackendError::unknown("mesh node", node.0)),
        }
    }

    fn remove_node(&mut self, scene: SceneId, node: NodeId) -> Result<(), BackendError> {
        let data = self
            .scenes
            .get_mut(&scene)
            .ok_or_else(|| BackendError::unknown("scene", scene.0))?;
        data.nodes.retain(|n| *n != node);
        self.nodes
            .remove(&node)
            .map(|_| ())
            .ok_or_else(|| BackendError::unknown("node", node.0))
    }

    fn clear_scene(&mut self, scene: SceneId) -> Result<(), BackendError> {
        let data = self
            .scenes
            .get_mut(&scene)
            .ok_or_else(|| BackendError::unknown("scene", scene.0))?;
        for node in data.nodes.drain(..) {
            self.nodes.remove(&node);
        }
        Ok(())
    }

    fn dispose(&mut self, resource: Resource) -> Result<(), BackendError> {
        let released = match resource {
            Resource::Scene(id) => match self.scenes.remove(&id) {
                Some(data) => {
                    for node in data.nodes {
                        self.nodes.remove(&node);
                    }
                    Some(id.0)
                }
                None => None,
            },
            Resource::Renderer(id) => self.renderers.remove(&id).map(|_| id.0),
            Resource::Geometry(id) => self.geometries.remove(&id).map(|_| id.0),
            Resource::Material(id) => self.materials.remove(&id).map(|_| id.0),
        };
        match released {
            Some(_) => Ok(()),
            None => Err(BackendError::unknown("resource", resource_id(resource))),
        }
    }

    fn render(&mut self, renderer: RendererId, scene: SceneId, camera: &Camera) -> Result<(), BackendError> {
        let data = self
            .scenes
            .get(&scene)
            .ok_or_else(|| BackendError::unknown("scene", scene.0))?;
        let shading = self.shading(data);

        let mut camera = camera.clone();
        camera.aspect /= CELL_ASPECT;
        let view_projection = camera.view_projection();

        let target = self
            .renderers
            .get_mut(&renderer)
            .ok_or_else(|| BackendError::unknown("renderer", renderer.0))?;
        target.clear(data.background);

        for content in data.nodes.iter().filter_map(|id| self.nodes.get(id)) {
            match content {
                NodeContent::Light(_) => {}
                NodeContent::Helper(helper) => draw_helper(target, helper, &view_projection),
                NodeContent::Mesh {
                    geometry,
                    material,
                    transform,
                } => {
                    let (Some(mesh), Some(state)) =
                        (self.geometries.get(geometry), self.materials.get_mut(material))
                    else {
                        continue;
                    };
                    if state.dirty {
                        log::debug!(
                            "Material {} now {}",
                            material.0,
                            if state.desc.wireframe { "wireframe" } else { "solid" }
                        );
                        state.dirty = false;
                    }
                    let style = SurfaceStyle {
                        color: state.desc.color,
                        wireframe: state.desc.wireframe,
                    };
                    target.render_mesh(mesh, &transform.matrix(), &view_projection, &shading, style);
                }
            }
        }

        target.draw(&mut self.out, self.origin.0, self.origin.1)?;
        self.out.flush()?;
        Ok(())
    }
}

fn resource_id(resource: Resource) -> u64 {
    match resource {
        Resource::Scene(id) => id.0,
        Resource::Renderer(id) => id.0,
        Resource::Geometry(id) => id.0,
        Resource::Material(id) => id.0,
    }
}
