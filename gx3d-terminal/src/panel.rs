//! Control panel drawn down the left edge of the terminal.
//!
//! The panel lists the catalog, shows the two toggle buttons and maps
//! key presses to viewer commands.

use crossterm::{
    cursor,
    event::KeyCode,
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
};
use gx3d_core::{Catalog, Rgb, ViewState};
use std::io::{self, Write};

use crate::renderer::to_color;

pub const PANEL_WIDTH: u16 = 24;

const HELP: [&str; 4] = ["1-9/Enter: select", "space/r: rotation", "w: wireframe", "q/Esc: quit"];

/// What a key press asks the viewer to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select(&'static str),
    ToggleRotation,
    ToggleWireframe,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelLine {
    pub text: String,
    pub color: Option<Rgb>,
    pub highlighted: bool,
}

impl PanelLine {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            highlighted: false,
        }
    }
}

pub fn rotation_label(auto_rotate: bool) -> &'static str {
    if auto_rotate {
        "Pause rotation"
    } else {
        "Resume rotation"
    }
}

/// Names the mode the button switches to
pub fn wireframe_label(wireframe: bool) -> &'static str {
    if wireframe {
        "Solid"
    } else {
        "Wireframe"
    }
}

#[derive(Debug, Default)]
pub struct ControlPanel {
    cursor: usize,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor onto `key`, e.g. after the selection changed elsewhere
    pub fn follow(&mut self, catalog: &Catalog, key: &str) {
        if let Some(index) = catalog.index_of(key) {
            self.cursor = index;
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, catalog: &Catalog) -> Option<Command> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
            KeyCode::Char(' ') | KeyCode::Char('r') => Some(Command::ToggleRotation),
            KeyCode::Char('w') => Some(Command::ToggleWireframe),
            KeyCode::Char(digit @ '1'..='9') => {
                let index = digit as usize - '1' as usize;
                let entry = catalog.entry_at(index)?;
                self.cursor = index;
                Some(Command::Select(entry.key))
            }
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                if self.cursor + 1 < catalog.len() {
                    self.cursor += 1;
                }
                None
            }
            KeyCode::Enter => catalog.entry_at(self.cursor).map(|entry| Command::Select(entry.key)),
            _ => None,
        }
    }

    /// Panel contents, top to bottom
    pub fn lines(&self, catalog: &Catalog, state: &ViewState, fps: f32) -> Vec<PanelLine> {
        let mut lines = vec![PanelLine::plain("Geometry Explorer"), PanelLine::plain("")];

        for (index, entry) in catalog.iter().enumerate() {
            let marker = if index == self.cursor { '>' } else { ' ' };
            lines.push(PanelLine {
                text: format!("{}{} {}", marker, index + 1, entry.description),
                color: Some(entry.color),
                highlighted: entry.key == state.selected,
            });
        }

        lines.push(PanelLine::plain(""));
        lines.push(PanelLine::plain(format!("[{}]", rotation_label(state.auto_rotate))));
        lines.push(PanelLine::plain(format!("[{}]", wireframe_label(state.wireframe))));
        lines.push(PanelLine::plain(""));
        lines.extend(HELP.iter().map(|help| PanelLine::plain(*help)));
        lines.push(PanelLine::plain(""));
        lines.push(PanelLine::plain(format!("FPS: {:.1}", fps)));
        lines
    }

    /// Draw the panel into the first [`PANEL_WIDTH`] columns
    pub fn draw<W: Write>(
        &self,
        writer: &mut W,
        catalog: &Catalog,
        state: &ViewState,
        fps: f32,
        height: u16,
    ) -> io::Result<()> {
        let width = PANEL_WIDTH as usize - 1;
        let lines = self.lines(catalog, state, fps);
        for row in 0..height {
            let line = lines.get(row as usize);
            let text: String = line.map(|l| l.text.as_str()).unwrap_or("").chars().take(width).collect();
            queue!(writer, cursor::MoveTo(0, row))?;
            match line {
                Some(PanelLine { color: Some(color), highlighted, .. }) => {
                    if *highlighted {
                        queue!(writer, SetAttribute(Attribute::Reverse))?;
                    }
                    queue!(writer, SetForegroundColor(to_color(*color)))?;
                }
                _ => queue!(writer, SetForegroundColor(Color::Grey))?,
            }
            queue!(
                writer,
                Print(format!("{:<width$}", text, width = width)),
                SetAttribute(Attribute::Reset),
                ResetColor,
                Print('|')
            )?;
        }
        Ok(())
    }
}
