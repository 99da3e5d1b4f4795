/// Model viewer - show an STL model under the explorer's lights and helpers
///
/// Usage: gx3d-model path/to/model.stl [--scale 1.2]
/// Controls: W toggles wireframe, Q/ESC quits.
///
/// Logging follows `RUST_LOG`; use `--log-file` to keep records off the frame.
use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal;
use gx3d_core::backend::{
    GeometryId, MaterialDesc, MaterialId, NodeId, RenderBackend, RendererId, Resource, SceneId,
};
use gx3d_core::controller::{default_camera, default_lights, BACKGROUND, REFERENCE_HELPERS};
use gx3d_core::host::FrameScheduler;
use gx3d_core::{Camera, ModelAsset, ModelLibrary, NodeTransform, Rgb, Viewport};
use gx3d_terminal::{enter_terminal, init_logging, restore_terminal, FrameClock, TerminalBackend};
use std::io::{stdout, Stdout};
use std::path::PathBuf;
use std::time::Duration;

const MODEL_COLOR: Rgb = Rgb::from_hex(0xb0b0b0);
const SPIN: f32 = 0.005;
/// Side length of the ground grid in `REFERENCE_HELPERS`
const GRID_SIZE: f32 = 10.0;

#[derive(Parser, Debug)]
#[command(name = "gx3d-model", about = "Terminal STL model viewer", version)]
struct Args {
    /// STL file to display
    path: PathBuf,

    /// Display scale
    #[arg(long, default_value_t = ModelAsset::DEFAULT_SCALE)]
    scale: f32,

    /// Target frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Write log records here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Everything allocated on the backend for one model
struct ModelView {
    backend: TerminalBackend<Stdout>,
    scene: SceneId,
    renderer: RendererId,
    geometry: GeometryId,
    material: MaterialId,
    node: NodeId,
    transform: NodeTransform,
    camera: Camera,
    wireframe: bool,
}

impl ModelView {
    fn build(asset: &ModelAsset, viewport: Viewport) -> anyhow::Result<Self> {
        let mut backend = TerminalBackend::new(stdout(), (0, 0));
        let scene = backend.create_scene(BACKGROUND)?;
        for light in default_lights() {
            backend.add_light(scene, light)?;
        }
        for helper in REFERENCE_HELPERS {
            backend.add_helper(scene, helper)?;
        }
        let renderer = backend.create_renderer(viewport)?;
        let geometry = backend.upload_mesh(&asset.mesh)?;
        let material = backend.create_material(MaterialDesc {
            color: MODEL_COLOR,
            wireframe: false,
        })?;
        let node = backend.add_mesh(scene, geometry, material)?;
        let transform = asset.transform();
        backend.set_transform(node, &transform)?;

        Ok(Self {
            backend,
            scene,
            renderer,
            geometry,
            material,
            node,
            transform,
            camera: default_camera(viewport),
            wireframe: false,
        })
    }

    fn frame(&mut self) -> anyhow::Result<()> {
        self.transform.rotation.rotate(0.0, SPIN, 0.0);
        self.backend.set_transform(self.node, &self.transform)?;
        self.backend.render(self.renderer, self.scene, &self.camera)?;
        Ok(())
    }

    fn toggle_wireframe(&mut self) -> anyhow::Result<()> {
        self.wireframe = !self.wireframe;
        self.backend.update_material(self.material, self.wireframe)?;
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) -> anyhow::Result<()> {
        if viewport.is_empty() {
            return Ok(());
        }
        self.camera.set_viewport(viewport);
        self.backend.set_viewport(self.renderer, viewport)?;
        Ok(())
    }

    fn release(mut self) {
        if let Err(err) = self.backend.remove_node(self.scene, self.node) {
            log::error!("Failed to detach model node: {}", err);
        }
        for resource in [
            Resource::Geometry(self.geometry),
            Resource::Material(self.material),
            Resource::Renderer(self.renderer),
            Resource::Scene(self.scene),
        ] {
            if let Err(err) = self.backend.dispose(resource) {
                log::error!("Failed to release {:?}: {}", resource, err);
            }
        }
        log::debug!("{} backend resources outstanding", self.backend.live_resources());
    }
}

fn view_size(width: u16, height: u16) -> Viewport {
    Viewport::new(width as u32, height.saturating_sub(1) as u32)
}

fn run(asset: &ModelAsset, fps: u32) -> anyhow::Result<()> {
    let (width, height) = terminal::size()?;
    let mut view = ModelView::build(asset, view_size(width, height))?;
    let mut clock = FrameClock::new(fps);
    clock.request_frame();

    let result = (|| -> anyhow::Result<()> {
        loop {
            while event::poll(Duration::ZERO)? {
                match event::read()? {
                    Event::Key(KeyEvent {
                        code,
                        kind: KeyEventKind::Press,
                        ..
                    }) => match code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Char('w') => view.toggle_wireframe()?,
                        _ => {}
                    },
                    Event::Resize(width, height) => view.resize(view_size(width, height))?,
                    _ => {}
                }
            }
            if clock.wait_for_frame() {
                clock.request_frame();
                view.frame()?;
            }
        }
    })();

    view.release();
    result
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let mut library = ModelLibrary::new();
    library
        .preload(&args.path)
        .with_context(|| format!("loading {}", args.path.display()))?;
    let asset = library.get(&args.path)?.clone().with_scale(args.scale);
    log::info!(
        "Loaded {} ({} triangles, scale {})",
        asset.path.display(),
        asset.triangle_count(),
        asset.scale
    );
    let extent = asset.extent();
    if extent.max() > GRID_SIZE {
        log::warn!(
            "Model spans {:.1} x {:.1} x {:.1}, larger than the reference grid; try a smaller --scale",
            extent.x,
            extent.y,
            extent.z
        );
    }

    enter_terminal()?;
    let result = run(&asset, args.fps);
    restore_terminal()?;
    result
}
