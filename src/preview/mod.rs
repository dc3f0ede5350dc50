//! Font preview: type text, see it rendered in the board font.
//!
//! Every edit submits a render request. Responses can arrive after newer
//! edits were made; only the newest admitted response replaces the board.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{cursor, queue, style, terminal};

use crate::config::ViewerConfig;
use crate::menubar::render_menubar;
use crate::render::BoardRenderer;
use crate::render::cell::Grid;
use crate::source::FrameSource;
use crate::source::worker::{LatestWins, Request, Response, Worker};
use crate::terminal::{TerminalGuard, Viewport, paint_grid, paint_status};
use crate::types::FontRender;

const INPUT_TOP: u16 = 1;
const POLL: Duration = Duration::from_millis(50);

/// What an input event did to the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Quit,
    Changed,
    Redraw,
    Ignored,
}

pub struct FontPreview {
    config: ViewerConfig,
    worker: Worker,
    gate: LatestWins,
    text: String,
    render: FontRender,
    grid: Grid,
    pending: Option<u64>,
    last_error: Option<String>,
}

impl FontPreview {
    pub fn new<S: FrameSource + Send + 'static>(
        config: ViewerConfig,
        source: S,
        initial_text: String,
    ) -> Result<Self> {
        let worker = Worker::spawn(source).context("Failed to start the request worker")?;
        Ok(FontPreview {
            config,
            worker,
            gate: LatestWins::new(),
            text: initial_text,
            render: FontRender::default(),
            grid: Grid::new(),
            pending: None,
            last_error: None,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn run(&mut self) -> Result<()> {
        let mut term = TerminalGuard::enter()?;
        self.request_render();
        self.redraw(term.out())?;

        loop {
            if event::poll(POLL)? {
                match self.handle_event(event::read()?) {
                    Edit::Quit => break,
                    Edit::Changed => {
                        self.request_render();
                        self.redraw(term.out())?;
                    }
                    Edit::Redraw => self.redraw(term.out())?,
                    Edit::Ignored => {}
                }
            }
            if self.pump() {
                self.redraw(term.out())?;
            }
        }

        Ok(())
    }

    /// Apply one terminal event to the text buffer.
    pub fn handle_event(&mut self, event: Event) -> Edit {
        let key = match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            Event::Resize(_, _) => return Edit::Redraw,
            _ => return Edit::Ignored,
        };
        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            return Edit::Quit;
        }
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.text.push(c);
                Edit::Changed
            }
            KeyCode::Enter => {
                self.text.push('\n');
                Edit::Changed
            }
            KeyCode::Backspace => match self.text.pop() {
                Some(_) => Edit::Changed,
                None => Edit::Ignored,
            },
            _ => Edit::Ignored,
        }
    }

    fn request_render(&mut self) {
        let request = self.config.font_request(&self.text);
        self.pending = self.worker.submit(Request::RenderText(request));
        if self.pending.is_none() {
            self.last_error = Some("request worker stopped".into());
        }
    }

    /// Apply finished renders. Returns true when something visible changed.
    fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Some(done) = self.worker.try_recv() {
            if self.pending == Some(done.seq) {
                self.pending = None;
                changed = true;
            }
            if !self.gate.admit(done.seq) {
                tracing::debug!(seq = done.seq, "discarding stale render");
                continue;
            }
            match done.result {
                Ok(Response::Rendered(render)) => {
                    self.grid = BoardRenderer::rasterize(
                        &BoardRenderer::project_font(&render),
                        &self.config.display,
                    );
                    self.render = render;
                    self.last_error = None;
                }
                Ok(Response::Playlist(_)) => {}
                Err(e) => {
                    tracing::warn!("font render failed: {e}");
                    self.last_error = Some(e.to_string());
                }
            }
            changed = true;
        }
        if self.pending.is_some() && !self.worker.is_alive() {
            tracing::error!("request worker stopped with a render outstanding");
            self.pending = None;
            self.last_error = Some("request worker stopped".into());
            changed = true;
        }
        changed
    }

    fn redraw<W: Write>(&self, out: &mut W) -> Result<()> {
        let (term_w, term_h) = terminal::size()?;
        queue!(out, terminal::Clear(terminal::ClearType::All))?;

        let items = [
            "[Esc] quit".to_string(),
            "[Enter] new line".to_string(),
            "[Backspace] delete".to_string(),
        ];
        render_menubar(out, 0, &items)?;

        let lines: Vec<&str> = self.text.split('\n').collect();
        for (i, line) in lines.iter().enumerate() {
            let y = INPUT_TOP + i as u16;
            if y >= term_h {
                break;
            }
            let prompt = if i == 0 { "> " } else { "  " };
            queue!(out, cursor::MoveTo(0, y), style::Print(prompt), style::Print(line))?;
        }

        let board_top = INPUT_TOP + lines.len() as u16 + 1;
        let view = Viewport {
            x: 0,
            y: board_top,
            width: term_w,
            height: term_h.saturating_sub(board_top + 1),
        };
        paint_grid(out, &self.grid, view)?;

        if term_h > board_top {
            paint_status(out, term_h - 1, term_w, &self.status_line())?;
        }
        Ok(())
    }

    fn status_line(&self) -> String {
        let mut status = format!(
            " {} | {} chars | {} dots",
            self.config.font.name,
            self.text.chars().count(),
            self.render.dot_count()
        );
        if self.pending.is_some() {
            status.push_str(" | rendering");
        }
        if let Some(err) = &self.last_error {
            status.push_str(&format!(" | error: {err}"));
        }
        status.push(' ');
        status
    }
}
