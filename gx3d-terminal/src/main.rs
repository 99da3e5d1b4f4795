/// Geometry Explorer - browse primitive shapes in the terminal
///
/// Controls:
///   - 1-9 / Up, Down, Enter: select a shape
///   - Space / R: pause or resume rotation
///   - W: toggle wireframe
///   - Q/ESC: Quit
///
/// Logging follows `RUST_LOG`. Records written to stderr land on top of the
/// frame, so pass `--log-file` when debugging.
use anyhow::Context;
use clap::Parser;
use gx3d_core::settings::{MemoryStore, SettingsStore, TomlFileStore};
use gx3d_core::{Catalog, ViewerConfig};
use gx3d_terminal::{init_logging, TerminalApp};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gx3d", about = "Interactive 3D geometry explorer", version)]
struct Args {
    /// Viewer configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Shape shown at startup
    #[arg(short, long)]
    shape: Option<String>,

    /// Target frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Settings file for the wireframe and rotation toggles
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Keep toggles in memory only
    #[arg(long)]
    no_persist: bool,

    /// Write log records here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the effective configuration to this file and exit
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Print the shape catalog and exit
    #[arg(long)]
    list: bool,
}

fn settings_store(args: &Args, config: &ViewerConfig) -> Box<dyn SettingsStore> {
    if args.no_persist {
        return Box::new(MemoryStore::new());
    }
    let path = args
        .settings
        .clone()
        .or_else(|| config.settings_path.clone())
        .or_else(TomlFileStore::default_path);
    match path {
        Some(path) => {
            log::info!("Persisting settings to {}", path.display());
            Box::new(TomlFileStore::open(path))
        }
        None => {
            log::warn!("No configuration directory, settings will not persist");
            Box::new(MemoryStore::new())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let catalog = Catalog::standard();

    if args.list {
        for (index, entry) in catalog.iter().enumerate() {
            println!("{} {:<10} {} ({})", index + 1, entry.key, entry.name, entry.color);
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(shape) = &args.shape {
        config.initial_shape = shape.clone();
    }
    if let Some(fps) = args.fps {
        config.target_fps = fps;
    }
    config.validate(&catalog)?;
    if let Some(path) = &args.save_config {
        config
            .save(path)
            .with_context(|| format!("writing config {}", path.display()))?;
        println!("Wrote {}", path.display());
        return Ok(());
    }
    log::info!(
        "Starting with {} at {} fps",
        config.initial_shape,
        config.target_fps
    );

    let store = settings_store(&args, &config);
    let mut app = TerminalApp::new(catalog, store, &config.initial_shape, config.target_fps)?;
    app.run()
}
