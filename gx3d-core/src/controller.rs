//! Scene lifecycle controller.
//!
//! Owns everything created for one mounted view: the scene, the renderer,
//! the camera, the fixed lights and helpers, and the single active display.
//! Every resource acquired by [`SceneController::mount`] is released exactly
//! once by [`SceneController::unmount`], which also runs on drop.

use nalgebra::Point3;

use crate::backend::{
    BackendError, GeometryId, Helper, Light, MaterialDesc, MaterialId, NodeId, RenderBackend,
    RendererId, Resource, SceneId,
};
use crate::catalog::{Catalog, CatalogEntry, DEFAULT_SHAPE};
use crate::color::Rgb;
use crate::error::{Result, ViewerError};
use crate::host::{FrameRequest, FrameScheduler, HostContainer, ObserverId};
use crate::projection::{Camera, Viewport};
use crate::settings::{SettingsStore, ViewSettings};
use crate::transform::NodeTransform;

/// Per-frame rotation applied to the active display (radians about X and Y)
pub const AUTO_ROTATE_STEP: (f32, f32) = (0.01, 0.015);

pub const BACKGROUND: Rgb = Rgb::from_hex(0x0a0a0a);
pub const CAMERA_FOV_DEGREES: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;

/// Axis indicator and ground grid added to every mounted scene
pub const REFERENCE_HELPERS: [Helper; 2] = [
    Helper::Axes { size: 2.0 },
    Helper::Grid {
        size: 10.0,
        divisions: 10,
        center_color: Rgb::from_hex(0x444444),
        line_color: Rgb::from_hex(0x222222),
    },
];

/// Fixed ambient and directional illumination
pub fn default_lights() -> [Light; 2] {
    [
        Light::Ambient {
            color: Rgb::WHITE,
            intensity: 0.35,
        },
        Light::Directional {
            color: Rgb::WHITE,
            intensity: 0.9,
            position: Point3::new(5.0, 5.0, 5.0),
        },
    ]
}

/// Perspective camera at (3, 2, 4) looking at the origin
pub fn default_camera(viewport: Viewport) -> Camera {
    Camera::perspective(CAMERA_FOV_DEGREES, viewport, CAMERA_NEAR, CAMERA_FAR)
        .look_at(Point3::new(3.0, 2.0, 4.0), Point3::origin())
}

/// Outcome of a mount attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStatus {
    Mounted,
    /// The host container is missing or has no area; nothing was created
    Deferred,
}

/// User-togglable display preferences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub selected: String,
    pub wireframe: bool,
    pub auto_rotate: bool,
}

/// The shape currently in the scene and the resources backing it
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDisplay {
    pub key: String,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub node: NodeId,
    pub transform: NodeTransform,
}

/// Resources tied to one mount. Optional fields are filled in as mount
/// progresses so a failed mount releases only what it acquired.
#[derive(Debug)]
struct Surface {
    scene: SceneId,
    renderer: Option<RendererId>,
    camera: Camera,
    viewport: Viewport,
    fixtures: Vec<NodeId>,
    display: Option<ActiveDisplay>,
    frame: Option<FrameRequest>,
    observer: Option<ObserverId>,
}

pub struct SceneController<B: RenderBackend, H: HostContainer, S: FrameScheduler> {
    backend: B,
    host: H,
    scheduler: S,
    catalog: Catalog,
    store: Box<dyn SettingsStore>,
    state: ViewState,
    surface: Option<Surface>,
}

impl<B: RenderBackend, H: HostContainer, S: FrameScheduler> SceneController<B, H, S> {
    /// Build an unmounted controller. Wireframe and auto-rotate are read
    /// from `store`; the selection starts at the catalog's default entry.
    pub fn new(
        backend: B,
        host: H,
        scheduler: S,
        catalog: Catalog,
        store: Box<dyn SettingsStore>,
    ) -> Self {
        let settings = ViewSettings::load(store.as_ref());
        let selected = if catalog.contains(DEFAULT_SHAPE) {
            DEFAULT_SHAPE
        } else {
            catalog.entry_at(0).map(|entry| entry.key).unwrap_or(DEFAULT_SHAPE)
        };
        log::debug!(
            "Initial view state: shape={}, wireframe={}, auto_rotate={}",
            selected,
            settings.wireframe,
            settings.auto_rotate
        );

        Self {
            backend,
            host,
            scheduler,
            catalog,
            store,
            state: ViewState {
                selected: selected.to_string(),
                wireframe: settings.wireframe,
                auto_rotate: settings.auto_rotate,
            },
            surface: None,
        }
    }

    /// Choose the shape shown at mount
    pub fn with_initial_shape(mut self, key: &str) -> Result<Self> {
        if !self.catalog.contains(key) {
            return Err(ViewerError::UnknownShape(key.to_string()));
        }
        self.state.selected = key.to_string();
        Ok(self)
    }

    /// Create the surface resources and start the animation loop.
    ///
    /// Mounting an already mounted controller tears the old surface down
    /// first. A missing or zero-sized container defers the mount.
    pub fn mount(&mut self) -> Result<MountStatus> {
        if self.surface.is_some() {
            log::info!("Re-mounting scene, releasing the previous surface");
            self.unmount();
        }

        let viewport = match self.host.bounds() {
            Some(viewport) if !viewport.is_empty() => viewport,
            other => {
                log::warn!("Host container unavailable ({:?}), deferring mount", other);
                return Ok(MountStatus::Deferred);
            }
        };

        let scene = self.backend.create_scene(BACKGROUND)?;
        let camera = default_camera(viewport);
        self.surface = Some(Surface {
            scene,
            renderer: None,
            camera,
            viewport,
            fixtures: Vec::with_capacity(4),
            display: None,
            frame: None,
            observer: None,
        });

        if let Err(err) = self.populate_surface(viewport) {
            log::error!("Mount failed, releasing partial surface: {}", err);
            self.unmount();
            return Err(err);
        }

        log::info!(
            "Mounted scene {}x{} showing {}",
            viewport.width,
            viewport.height,
            self.state.selected
        );
        Ok(MountStatus::Mounted)
    }

    fn populate_surface(&mut self, viewport: Viewport) -> Result<()> {
        let Self {
            backend,
            host,
            scheduler,
            catalog,
            state,
            surface,
            ..
        } = self;
        let Some(surface) = surface.as_mut() else {
            return Ok(());
        };

        let renderer = backend.create_renderer(viewport)?;
        surface.renderer = Some(renderer);
        host.attach_surface(renderer);

        for light in default_lights() {
            surface.fixtures.push(backend.add_light(surface.scene, light)?);
        }
        for helper in REFERENCE_HELPERS {
            surface.fixtures.push(backend.add_helper(surface.scene, helper)?);
        }

        let entry = lookup(catalog, &state.selected)?;
        surface.display = Some(create_display(backend, surface.scene, entry, state.wireframe)?);

        surface.frame = Some(scheduler.request_frame());
        surface.observer = Some(host.observe_resize());
        Ok(())
    }

    /// Release everything the current mount acquired. Does nothing when
    /// not mounted, so repeated calls are harmless.
    pub fn unmount(&mut self) {
        let Some(mut surface) = self.surface.take() else {
            return;
        };

        if let Some(observer) = surface.observer.take() {
            self.host.unobserve_resize(observer);
        }
        if let Some(frame) = surface.frame.take() {
            self.scheduler.cancel_frame(frame);
        }
        if let Some(renderer) = surface.renderer.take() {
            self.host.detach_surface(renderer);
            log_release(self.backend.dispose(Resource::Renderer(renderer)));
        }
        if let Some(display) = surface.display.take() {
            log_release(release_display(&mut self.backend, surface.scene, display));
        }
        surface.fixtures.clear();
        log_release(self.backend.clear_scene(surface.scene));
        log_release(self.backend.dispose(Resource::Scene(surface.scene)));

        log::info!("Unmounted scene");
    }

    /// Replace the active display with the catalog entry `key`.
    ///
    /// Unknown keys are a caller bug and are reported as
    /// [`ViewerError::UnknownShape`]. Before mount only the selection is
    /// recorded.
    pub fn select(&mut self, key: &str) -> Result<()> {
        let entry = lookup(&self.catalog, key)?;
        self.state.selected = key.to_string();

        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        match surface.display.take() {
            Some(previous) if previous.key == key => {
                surface.display = Some(previous);
                return Ok(());
            }
            Some(previous) => {
                log::debug!("Replacing {} with {}", previous.key, key);
                release_display(&mut self.backend, surface.scene, previous)?;
            }
            // A previous replacement failed part way; rebuild from scratch
            None => log::warn!("No active display, creating {}", key),
        }
        surface.display = Some(create_display(
            &mut self.backend,
            surface.scene,
            entry,
            self.state.wireframe,
        )?);
        Ok(())
    }

    pub fn toggle_wireframe(&mut self) -> Result<()> {
        self.set_wireframe(!self.state.wireframe)
    }

    /// Switch the material between solid and wireframe without touching the geometry
    pub fn set_wireframe(&mut self, wireframe: bool) -> Result<()> {
        if self.state.wireframe == wireframe {
            return Ok(());
        }
        self.state.wireframe = wireframe;
        if let Err(err) = self.settings().save_wireframe(self.store.as_mut()) {
            log::warn!("Could not persist wireframe setting: {}", err);
        }

        if let Some(display) = self.surface.as_ref().and_then(|s| s.display.as_ref()) {
            self.backend.update_material(display.material, wireframe)?;
        }
        Ok(())
    }

    pub fn toggle_auto_rotate(&mut self) {
        self.set_auto_rotate(!self.state.auto_rotate);
    }

    /// Takes effect on the next tick
    pub fn set_auto_rotate(&mut self, auto_rotate: bool) {
        if self.state.auto_rotate == auto_rotate {
            return;
        }
        self.state.auto_rotate = auto_rotate;
        if let Err(err) = self.settings().save_auto_rotate(self.store.as_mut()) {
            log::warn!("Could not persist auto-rotate setting: {}", err);
        }
    }

    /// One animation frame: re-arm the frame request, advance the rotation
    /// when enabled, and render. A tick while unmounted does nothing.
    pub fn tick(&mut self) -> Result<()> {
        let Self {
            backend,
            scheduler,
            state,
            surface,
            ..
        } = self;
        let Some(surface) = surface.as_mut() else {
            return Ok(());
        };

        if let Some(stale) = surface.frame.take() {
            scheduler.cancel_frame(stale);
        }
        surface.frame = Some(scheduler.request_frame());

        if state.auto_rotate {
            if let Some(display) = surface.display.as_mut() {
                display
                    .transform
                    .rotation
                    .rotate(AUTO_ROTATE_STEP.0, AUTO_ROTATE_STEP.1, 0.0);
                backend.set_transform(display.node, &display.transform)?;
            }
        }

        if let Some(renderer) = surface.renderer {
            backend.render(renderer, surface.scene, &surface.camera)?;
        }
        Ok(())
    }

    /// Re-measure the container and resize camera and renderer.
    ///
    /// A zero dimension keeps the last good value for that dimension.
    pub fn handle_resize(&mut self) -> Result<()> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };

        let measured = self.host.bounds().unwrap_or(Viewport::new(0, 0));
        let viewport = measured.or_last_good(surface.viewport);
        if measured.is_empty() {
            log::debug!("Container measured {:?}, keeping {:?}", measured, viewport);
        }

        surface.viewport = viewport;
        surface.camera.set_viewport(viewport);
        if let Some(renderer) = surface.renderer {
            self.backend.set_viewport(renderer, viewport)?;
        }
        Ok(())
    }

    fn settings(&self) -> ViewSettings {
        ViewSettings {
            wireframe: self.state.wireframe,
            auto_rotate: self.state.auto_rotate,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn active_display(&self) -> Option<&ActiveDisplay> {
        self.surface.as_ref().and_then(|s| s.display.as_ref())
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.surface.as_ref().map(|s| &s.camera)
    }

    /// Last good surface size, while mounted
    pub fn viewport(&self) -> Option<Viewport> {
        self.surface.as_ref().map(|s| s.viewport)
    }

    pub fn settings_store(&self) -> &dyn SettingsStore {
        self.store.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

impl<B: RenderBackend, H: HostContainer, S: FrameScheduler> Drop for SceneController<B, H, S> {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn lookup<'a>(catalog: &'a Catalog, key: &str) -> Result<&'a CatalogEntry> {
    catalog.get(key).ok_or_else(|| {
        log::error!("Selected shape `{}` is not in the catalog", key);
        ViewerError::UnknownShape(key.to_string())
    })
}

/// Build geometry, material and node for `entry`, releasing the partial
/// allocation if a later step fails.
fn create_display<B: RenderBackend>(
    backend: &mut B,
    scene: SceneId,
    entry: &CatalogEntry,
    wireframe: bool,
) -> std::result::Result<ActiveDisplay, BackendError> {
    let shape = entry.create();
    let geometry = backend.create_geometry(&shape)?;

    let material = match backend.create_material(MaterialDesc {
        color: entry.color,
        wireframe,
    }) {
        Ok(material) => material,
        Err(err) => {
            log_release(backend.dispose(Resource::Geometry(geometry)));
            return Err(err);
        }
    };

    let node = match backend.add_mesh(scene, geometry, material) {
        Ok(node) => node,
        Err(err) => {
            log_release(backend.dispose(Resource::Geometry(geometry)));
            log_release(backend.dispose(Resource::Material(material)));
            return Err(err);
        }
    };

    log::debug!("Created {} display ({})", entry.key, shape.name());
    Ok(ActiveDisplay {
        key: entry.key.to_string(),
        geometry,
        material,
        node,
        transform: NodeTransform::default(),
    })
}

/// Detach the node and release geometry and material. All three calls are
/// made even if one fails; the first error is returned.
fn release_display<B: RenderBackend>(
    backend: &mut B,
    scene: SceneId,
    display: ActiveDisplay,
) -> std::result::Result<(), BackendError> {
    let detached = backend.remove_node(scene, display.node);
    let geometry = backend.dispose(Resource::Geometry(display.geometry));
    let material = backend.dispose(Resource::Material(display.material));
    detached.and(geometry).and(material)
}

fn log_release(result: std::result::Result<(), BackendError>) {
    if let Err(err) = result {
        log::warn!("Resource release failed during teardown: {}", err);
    }
}
