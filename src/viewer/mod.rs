//! Viewer: the interactive playback front end.
//!
//! Fetches a site's playlist through the request worker, lets the playback
//! driver pick frames on the ticker's schedule, and paints the rendered
//! board grid to the terminal. Network failures never stop playback; the
//! last good frame stays up and the error shows in the status bar.

use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{event, terminal};

use crate::config::{ViewerConfig, matches_binding};
use crate::driver::ticker::Ticker;
use crate::driver::{PlaybackDriver, Refresh};
use crate::menubar::render_menubar;
use crate::render::BoardRenderer;
use crate::render::cell::Grid;
use crate::source::FrameSource;
use crate::source::worker::{LatestWins, Request, Response, Worker};
use crate::terminal::{TerminalGuard, Viewport, clear_viewport, paint_changes, paint_grid, paint_status};
use crate::types::PlaybackState;

/// Rows reserved above the canvas for the menu bar.
const CANVAS_OFFSET: u16 = 1;

/// Longest the loop waits for input before checking for completions.
const MAX_WAIT: Duration = Duration::from_millis(50);

const WORKER_STOPPED: &str = "request worker stopped";

pub struct Viewer {
    config: ViewerConfig,
    driver: PlaybackDriver,
    worker: Worker,
    gate: LatestWins,
    /// Site name or file path, shown in the status bar.
    label: String,
    in_flight: Option<u64>,
    state: Option<PlaybackState>,
    grid: Grid,
    paused: bool,
    last_error: Option<String>,
}

impl Viewer {
    pub fn new<S: FrameSource + Send + 'static>(
        config: ViewerConfig,
        source: S,
        label: String,
        follow: bool,
    ) -> Result<Self> {
        let refresh = if follow { Refresh::EveryTick } else { Refresh::Once };
        let driver = PlaybackDriver::new(refresh, config.poll_interval());
        let worker = Worker::spawn(source).context("Failed to start the request worker")?;
        Ok(Viewer {
            config,
            driver,
            worker,
            gate: LatestWins::new(),
            label,
            in_flight: None,
            state: None,
            grid: Grid::new(),
            paused: false,
            last_error: None,
        })
    }

    /// Take over the terminal and play until the user quits.
    pub fn play(&mut self) -> Result<()> {
        let mut term = TerminalGuard::enter()?;
        self.run_loop(&mut term)
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    fn run_loop(&mut self, term: &mut TerminalGuard) -> Result<()> {
        self.request_refresh();
        self.render_menubar(term.out())?;
        self.render_status(term.out())?;

        let mut ticker = Ticker::new(self.driver.period(), Instant::now());

        loop {
            let wait = ticker.timeout(Instant::now()).min(MAX_WAIT);
            if event::poll(wait)? {
                match event::read()? {
                    event::Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                        let keys = &self.config.key_bindings;
                        if matches_binding(&keys.quit, &key) || key.code == event::KeyCode::Esc {
                            break;
                        } else if matches_binding(&keys.pause, &key) {
                            self.paused = !self.paused;
                            self.render_status(term.out())?;
                        } else if matches_binding(&keys.fullscreen, &key) {
                            term.toggle_fullscreen()?;
                        }
                    }
                    event::Event::Resize(_, _) => self.render_all(term.out())?,
                    _ => {}
                }
            }

            if self.pump() {
                // A new item starts playing right away at its own rate.
                ticker = Ticker::new(self.driver.period(), Instant::now());
                self.render_status(term.out())?;
            }

            if ticker.poll(Instant::now()) {
                if !self.paused {
                    if let Some(state) = self.driver.advance() {
                        tracing::trace!(%state, "tick");
                        self.show(term.out(), state)?;
                    }
                }
                if self.driver.needs_refresh() {
                    self.request_refresh();
                }
                ticker.set_period(self.driver.period());
            }
        }

        Ok(())
    }

    fn request_refresh(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        self.in_flight = self.worker.submit(Request::Playlist {
            site: self.config.site.clone(),
        });
        if self.in_flight.is_none() {
            self.last_error = Some(WORKER_STOPPED.into());
        }
    }

    /// Apply finished fetches. Returns true when the playing item changed.
    fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Some(done) = self.worker.try_recv() {
            if self.in_flight == Some(done.seq) {
                self.in_flight = None;
            }
            if !self.gate.admit(done.seq) {
                tracing::debug!(seq = done.seq, "discarding stale playlist");
                continue;
            }
            match done.result {
                Ok(Response::Playlist(playlist)) => {
                    if playlist.videos.is_empty() && self.driver.current().is_none() {
                        self.last_error = Some(format!("{} is not playing anything", self.label));
                    } else {
                        self.last_error = None;
                    }
                    changed |= self.driver.accept(Ok(playlist));
                }
                Ok(Response::Rendered(_)) => {}
                Err(e) => {
                    self.last_error = Some(e.to_string());
                    self.driver.accept(Err(e));
                }
            }
        }
        if self.in_flight.is_some() && !self.worker.is_alive() {
            tracing::error!("request worker stopped with a fetch outstanding");
            self.in_flight = None;
            self.last_error = Some(WORKER_STOPPED.into());
        }
        changed
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn canvas(&self) -> Result<Viewport> {
        let (term_w, term_h) = terminal::size()?;
        Ok(Viewport {
            x: 0,
            y: CANVAS_OFFSET,
            width: term_w,
            // One row for the status bar.
            height: term_h.saturating_sub(CANVAS_OFFSET + 1),
        })
    }

    fn show<W: Write>(&mut self, out: &mut W, state: PlaybackState) -> Result<()> {
        let grid = BoardRenderer::rasterize(&BoardRenderer::project(&state), &self.config.display);
        let view = self.canvas()?;
        let same_shape = grid.len() == self.grid.len()
            && grid.first().map(Vec::len) == self.grid.first().map(Vec::len);
        if same_shape {
            paint_changes(out, &BoardRenderer::diff(&self.grid, &grid), view)?;
        } else {
            clear_viewport(out, view)?;
            paint_grid(out, &grid, view)?;
        }
        self.grid = grid;
        self.state = Some(state);
        self.render_status(out)
    }

    fn render_all<W: Write>(&self, out: &mut W) -> Result<()> {
        crossterm::queue!(out, terminal::Clear(terminal::ClearType::All))?;
        self.render_menubar(out)?;
        paint_grid(out, &self.grid, self.canvas()?)?;
        self.render_status(out)
    }

    fn render_menubar<W: Write>(&self, out: &mut W) -> Result<()> {
        let keys = &self.config.key_bindings;
        let items = [
            format!("[{}][Esc] quit", keys.quit),
            format!("[{}] pause", keys.pause),
            format!("[{}] full", keys.fullscreen),
        ];
        render_menubar(out, 0, &items)
    }

    fn render_status<W: Write>(&self, out: &mut W) -> Result<()> {
        let (term_w, term_h) = terminal::size()?;
        if term_h <= CANVAS_OFFSET + 1 {
            return Ok(()); // No room for status bar.
        }
        paint_status(out, term_h - 1, term_w, &self.status_line())
    }

    fn status_line(&self) -> String {
        let mut status = format!(" {} {}", if self.paused { "||" } else { ">" }, self.label);
        match &self.state {
            Some(state) => status.push_str(&format!(
                " | frame {}/{}",
                state.frame_index + 1,
                state.frame_count
            )),
            None if self.in_flight.is_some() => status.push_str(" | loading"),
            None => status.push_str(" | nothing to show"),
        }
        if let Some(item) = self.driver.current() {
            if item.fps > 0.0 {
                status.push_str(&format!(" | {} fps", item.fps));
            }
        }
        if let Some(err) = &self.last_error {
            status.push_str(&format!(" | error: {err}"));
        }
        status.push(' ');
        status
    }
}
