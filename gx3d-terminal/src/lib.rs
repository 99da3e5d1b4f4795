/// Terminal front end for the geometry explorer
use crossterm::{
    cursor,
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{self, ClearType},
};
use gx3d_core::settings::SettingsStore;
use gx3d_core::{Catalog, MountStatus, SceneController};
use std::fs::File;
use std::io::{self, stdout, Stdout, Write};
use std::path::Path;
use std::time::{Duration, Instant};

pub mod backend;
pub mod host;
pub mod panel;
pub mod renderer;

pub use backend::TerminalBackend;
pub use host::{FrameClock, TerminalHost};
pub use panel::{Command, ControlPanel, PANEL_WIDTH};
pub use renderer::AsciiRenderer;

/// Poll interval while no frame is scheduled (deferred mount)
const IDLE_POLL: Duration = Duration::from_millis(100);

pub type TerminalController = SceneController<TerminalBackend<Stdout>, TerminalHost, FrameClock>;

/// Start `env_logger` from `RUST_LOG`. Stderr shares the screen with the
/// rendered frame, so `log_file` redirects records away from it.
pub fn init_logging(log_file: Option<&Path>) -> io::Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(path) = log_file {
        let file = File::create(path)?;
        builder
            .filter_level(log::LevelFilter::Info)
            .parse_default_env()
            .target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Put the terminal into raw mode on the alternate screen
pub fn enter_terminal() -> io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)
}

/// Undo [`enter_terminal`]
pub fn restore_terminal() -> io::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)
}

/// Main application struct: the scene controller plus the panel and event loop
pub struct TerminalApp {
    controller: TerminalController,
    panel: ControlPanel,
    running: bool,
    last_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(
        catalog: Catalog,
        store: Box<dyn SettingsStore>,
        initial_shape: &str,
        fps: u32,
    ) -> anyhow::Result<Self> {
        let host = TerminalHost::new(PANEL_WIDTH, terminal::size()?);
        let backend = TerminalBackend::new(stdout(), host.surface_origin());
        let controller = SceneController::new(backend, host, FrameClock::new(fps), catalog, store)
            .with_initial_shape(initial_shape)?;

        let mut panel = ControlPanel::new();
        panel.follow(controller.catalog(), &controller.state().selected);

        Ok(Self {
            controller,
            panel,
            running: true,
            last_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn controller(&self) -> &TerminalController {
        &self.controller
    }

    /// Run until the user quits. The terminal is restored even when the loop fails.
    pub fn run(&mut self) -> anyhow::Result<()> {
        enter_terminal()?;
        execute!(stdout(), terminal::Clear(ClearType::All))?;

        let result = self.main_loop();
        self.controller.unmount();

        restore_terminal()?;
        result
    }

    fn main_loop(&mut self) -> anyhow::Result<()> {
        if self.controller.mount()? == MountStatus::Deferred {
            log::warn!("Terminal too small for the view, waiting for a resize");
        }
        self.draw_panel()?;

        while self.running {
            let timeout = self
                .controller
                .scheduler()
                .time_until_due()
                .unwrap_or(IDLE_POLL);

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(KeyEvent {
                        code,
                        kind: KeyEventKind::Press,
                        ..
                    }) => {
                        let command = self.panel.handle_key(code, self.controller.catalog());
                        if let Some(command) = command {
                            self.apply(command)?;
                        }
                        self.draw_panel()?;
                    }
                    Event::Resize(width, height) => self.resize(width, height)?,
                    _ => {}
                }
            }

            if self.controller.scheduler_mut().take_due() {
                self.controller.tick()?;
                self.count_frame()?;
            }
        }

        Ok(())
    }

    fn apply(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Select(key) => self.controller.select(key)?,
            Command::ToggleRotation => self.controller.toggle_auto_rotate(),
            Command::ToggleWireframe => self.controller.toggle_wireframe()?,
            Command::Quit => self.running = false,
        }
        Ok(())
    }

    fn resize(&mut self, width: u16, height: u16) -> anyhow::Result<()> {
        execute!(stdout(), terminal::Clear(ClearType::All))?;
        if self.controller.host_mut().set_terminal_size(width, height) {
            self.controller.handle_resize()?;
        } else if !self.controller.is_mounted() {
            self.controller.mount()?;
        }
        Ok(self.draw_panel()?)
    }

    fn count_frame(&mut self) -> io::Result<()> {
        self.frame_count += 1;
        let elapsed = self.last_sample.elapsed();
        if elapsed.as_secs() >= 1 {
            self.fps = self.frame_count as f32 / elapsed.as_secs_f32();
            self.frame_count = 0;
            self.last_sample = Instant::now();
            self.draw_panel()?;
        }
        Ok(())
    }

    fn draw_panel(&mut self) -> io::Result<()> {
        let (_, height) = terminal::size()?;
        let mut out = stdout();
        self.panel.draw(
            &mut out,
            self.controller.catalog(),
            self.controller.state(),
            self.fps,
            height,
        )?;
        out.flush()
    }
}
