//! Test doubles for the controller's collaborators.
//!
//! `RecordingBackend` tracks every allocation in a shared ledger so tests can
//! check for leaks and double releases after the controller is gone.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::backend::{
    BackendError, GeometryId, Helper, Light, MaterialDesc, MaterialId, NodeId, RenderBackend,
    RendererId, Resource, SceneId,
};
use crate::color::Rgb;
use crate::geometry::{Mesh, ShapeKind};
use crate::host::{FrameRequest, FrameScheduler, HostContainer, ObserverId};
use crate::projection::{Camera, Viewport};
use crate::transform::NodeTransform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Light,
    Helper,
    Mesh,
}

#[derive(Debug, Default)]
pub struct Ledger {
    next_id: u64,
    live: HashSet<Resource>,
    shapes: HashMap<GeometryId, ShapeKind>,
    materials: HashMap<MaterialId, MaterialDesc>,
    nodes: HashMap<NodeId, (SceneId, NodeKind)>,
    transforms: HashMap<NodeId, NodeTransform>,
    renders: usize,
    material_updates: usize,
    last_viewport: Option<Viewport>,
    double_releases: usize,
}

impl Ledger {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Outstanding scenes, renderers, geometries and materials
    pub fn live(&self) -> usize {
        self.live.len()
    }

    fn count(&self, pred: impl Fn(&Resource) -> bool) -> usize {
        self.live.iter().filter(|r| pred(r)).count()
    }
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    ledger: Rc<RefCell<Ledger>>,
    fail_on: Option<&'static str>,
}

impl RecordingBackend {
    pub fn ledger(&self) -> Rc<RefCell<Ledger>> {
        Rc::clone(&self.ledger)
    }

    /// Make the named operation fail from now on
    pub fn fail_on(&mut self, operation: &'static str) {
        self.fail_on = Some(operation);
    }

    pub fn clear_failure(&mut self) {
        self.fail_on = None;
    }

    fn check(&self, operation: &'static str) -> Result<(), BackendError> {
        if self.fail_on == Some(operation) {
            return Err(BackendError::Surface(format!("injected failure in {}", operation)));
        }
        Ok(())
    }

    fn add_node(&mut self, scene: SceneId, kind: NodeKind) -> Result<NodeId, BackendError> {
        let mut ledger = self.ledger.borrow_mut();
        if !ledger.live.contains(&Resource::Scene(scene)) {
            return Err(BackendError::unknown("scene", scene.0));
        }
        let node = NodeId(ledger.next());
        ledger.nodes.insert(node, (scene, kind));
        Ok(node)
    }

    pub fn live_resources(&self) -> usize {
        self.ledger.borrow().live()
    }

    /// Live geometry/material pairs; the two counts must agree
    pub fn live_displays(&self) -> usize {
        let ledger = self.ledger.borrow();
        let geometries = ledger.count(|r| matches!(r, Resource::Geometry(_)));
        let materials = ledger.count(|r| matches!(r, Resource::Material(_)));
        assert_eq!(geometries, materials, "geometry and material counts diverged");
        geometries
    }

    pub fn live_renderers(&self) -> usize {
        self.ledger
            .borrow()
            .count(|r| matches!(r, Resource::Renderer(_)))
    }

    pub fn live_scenes(&self) -> usize {
        self.ledger.borrow().count(|r| matches!(r, Resource::Scene(_)))
    }

    pub fn is_live(&self, resource: Resource) -> bool {
        self.ledger.borrow().live.contains(&resource)
    }

    pub fn shape_of(&self, geometry: GeometryId) -> Option<ShapeKind> {
        self.ledger.borrow().shapes.get(&geometry).copied()
    }

    pub fn material(&self, material: MaterialId) -> Option<MaterialDesc> {
        self.ledger.borrow().materials.get(&material).copied()
    }

    pub fn has_node(&self, node: NodeId) -> bool {
        self.ledger.borrow().nodes.contains_key(&node)
    }

    pub fn nodes_in_scene(&self) -> usize {
        self.ledger.borrow().nodes.len()
    }

    fn nodes_of(&self, kind: NodeKind) -> usize {
        self.ledger
            .borrow()
            .nodes
            .values()
            .filter(|(_, k)| *k == kind)
            .count()
    }

    pub fn lights(&self) -> usize {
        self.nodes_of(NodeKind::Light)
    }

    pub fn helpers(&self) -> usize {
        self.nodes_of(NodeKind::Helper)
    }

    pub fn renders(&self) -> usize {
        self.ledger.borrow().renders
    }

    pub fn material_updates(&self) -> usize {
        self.ledger.borrow().material_updates
    }

    pub fn last_viewport(&self) -> Option<Viewport> {
        self.ledger.borrow().last_viewport
    }

    pub fn double_releases(&self) -> usize {
        self.ledger.borrow().double_releases
    }
}

impl RenderBackend for RecordingBackend {
    fn create_scene(&mut self, _background: Rgb) -> Result<SceneId, BackendError> {
        self.check("create_scene")?;
        let mut ledger = self.ledger.borrow_mut();
        let scene = SceneId(ledger.next());
        ledger.live.insert(Resource::Scene(scene));
        Ok(scene)
    }

    fn create_renderer(&mut self, viewport: Viewport) -> Result<RendererId, BackendError> {
        self.check("create_renderer")?;
        let mut ledger = self.ledger.borrow_mut();
        let renderer = RendererId(ledger.next());
        ledger.live.insert(Resource::Renderer(renderer));
        ledger.last_viewport = Some(viewport);
        Ok(renderer)
    }

    fn set_viewport(&mut self, renderer: RendererId, viewport: Viewport) -> Result<(), BackendError> {
        let mut ledger = self.ledger.borrow_mut();
        if !ledger.live.contains(&Resource::Renderer(renderer)) {
            return Err(BackendError::unknown("renderer", renderer.0));
        }
        ledger.last_viewport = Some(viewport);
        Ok(())
    }

    fn add_light(&mut self, scene: SceneId, _light: Light) -> Result<NodeId, BackendError> {
        self.check("add_light")?;
        self.add_node(scene, NodeKind::Light)
    }

    fn add_helper(&mut self, scene: SceneId, _helper: Helper) -> Result<NodeId, BackendError> {
        self.check("add_helper")?;
        self.add_node(scene, NodeKind::Helper)
    }

    fn create_geometry(&mut self, shape: &ShapeKind) -> Result<GeometryId, BackendError> {
        self.check("create_geometry")?;
        let mut ledger = self.ledger.borrow_mut();
        let geometry = GeometryId(ledger.next());
        ledger.live.insert(Resource::Geometry(geometry));
        ledger.shapes.insert(geometry, *shape);
        Ok(geometry)
    }

    fn upload_mesh(&mut self, _mesh: &Mesh) -> Result<GeometryId, BackendError> {
        self.check("upload_mesh")?;
        let mut ledger = self.ledger.borrow_mut();
        let geometry = GeometryId(ledger.next());
        ledger.live.insert(Resource::Geometry(geometry));
        Ok(geometry)
    }

    fn create_material(&mut self, desc: MaterialDesc) -> Result<MaterialId, BackendError> {
        self.check("create_material")?;
        let mut ledger = self.ledger.borrow_mut();
        let material = MaterialId(ledger.next());
        ledger.live.insert(Resource::Material(material));
        ledger.materials.insert(material, desc);
        Ok(material)
    }

    fn update_material(&mut self, material: MaterialId, wireframe: bool) -> Result<(), BackendError> {
        let mut ledger = self.ledger.borrow_mut();
        let desc = ledger
            .materials
            .get_mut(&material)
            .ok_or_else(|| BackendError::unknown("material", material.0))?;
        desc.wireframe = wireframe;
        ledger.material_updates += 1;
        Ok(())
    }

    fn add_mesh(
        &mut self,
        scene: SceneId,
        geometry: GeometryId,
        material: MaterialId,
    ) -> Result<NodeId, BackendError> {
        self.check("add_mesh")?;
        {
            let ledger = self.ledger.borrow();
            if !ledger.live.contains(&Resource::Geometry(geometry)) {
                return Err(BackendError::unknown("geometry", geometry.0));
            }
            if !ledger.live.contains(&Resource::Material(material)) {
                return Err(BackendError::unknown("material", material.0));
            }
        }
        self.add_node(scene, NodeKind::Mesh)
    }

    fn set_transform(&mut self, node: NodeId, transform: &NodeTransform) -> Result<(), BackendError> {
        let mut ledger = self.ledger.borrow_mut();
        if !ledger.nodes.contains_key(&node) {
            return Err(BackendError::unknown("node", node.0));
        }
        ledger.transforms.insert(node, *transform);
        Ok(())
    }

    fn remove_node(&mut self, _scene: SceneId, node: NodeId) -> Result<(), BackendError> {
        let mut ledger = self.ledger.borrow_mut();
        ledger.transforms.remove(&node);
        ledger
            .nodes
            .remove(&node)
            .map(|_| ())
            .ok_or_else(|| BackendError::unknown("node", node.0))
    }

    fn clear_scene(&mut self, scene: SceneId) -> Result<(), BackendError> {
        let mut ledger = self.ledger.borrow_mut();
        ledger.nodes.retain(|_, (owner, _)| *owner != scene);
        Ok(())
    }

    fn dispose(&mut self, resource: Resource) -> Result<(), BackendError> {
        let mut ledger = self.ledger.borrow_mut();
        if !ledger.live.remove(&resource) {
            ledger.double_releases += 1;
            return Err(BackendError::unknown("resource", 0));
        }
        match resource {
            Resource::Geometry(id) => {
                ledger.shapes.remove(&id);
            }
            Resource::Material(id) => {
                ledger.materials.remove(&id);
            }
            Resource::Scene(_) | Resource::Renderer(_) => {}
        }
        Ok(())
    }

    fn render(&mut self, renderer: RendererId, scene: SceneId, _camera: &Camera) -> Result<(), BackendError> {
        let mut ledger = self.ledger.borrow_mut();
        if !ledger.live.contains(&Resource::Renderer(renderer))
            || !ledger.live.contains(&Resource::Scene(scene))
        {
            return Err(BackendError::unknown("renderer", renderer.0));
        }
        ledger.renders += 1;
        Ok(())
    }
}

/// Frame scheduler the test fires by hand
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: HashSet<u64>,
}

impl ManualScheduler {
    /// Consume every pending request; true if there was one
    pub fn fire(&mut self) -> bool {
        let had_pending = !self.pending.is_empty();
        self.pending.clear();
        had_pending
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        self.pending.insert(self.next_id);
        FrameRequest(self.next_id)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.pending.remove(&request.0);
    }
}

/// Container with settable bounds
#[derive(Debug, Default)]
pub struct TestHost {
    bounds: Option<Viewport>,
    attached: Vec<RendererId>,
    observers: HashSet<u64>,
    next_id: u64,
}

impl TestHost {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            bounds: Some(Viewport::new(width, height)),
            ..Self::default()
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.bounds = Some(Viewport::new(width, height));
    }

    pub fn attached(&self) -> &[RendererId] {
        &self.attached
    }

    pub fn observers(&self) -> usize {
        self.observers.len()
    }
}

impl HostContainer for TestHost {
    fn bounds(&self) -> Option<Viewport> {
        self.bounds
    }

    fn attach_surface(&mut self, renderer: RendererId) {
        self.attached.push(renderer);
    }

    fn detach_surface(&mut self, renderer: RendererId) {
        self.attached.retain(|r| *r != renderer);
    }

    fn observe_resize(&mut self) -> ObserverId {
        self.next_id += 1;
        self.observers.insert(self.next_id);
        ObserverId(self.next_id)
    }

    fn unobserve_resize(&mut self, observer: ObserverId) {
        self.observers.remove(&observer.0);
    }
}
