//! Terminal ownership and grid painting shared by the interactive views.

use std::io::{self, Write};

use anyhow::Result;
use crossterm::{cursor, execute, queue, style, terminal};

use crate::render::cell::{CellChange, Grid, to_content_style};

/// Raw mode plus the alternate screen for as long as the guard lives.
///
/// Dropping the guard restores the terminal on every exit path, errors
/// and panics included.
pub struct TerminalGuard {
    stdout: io::Stdout,
    fullscreen: bool,
}

impl TerminalGuard {
    pub fn enter() -> Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;
        Ok(TerminalGuard {
            stdout,
            fullscreen: false,
        })
    }

    pub fn out(&mut self) -> &mut io::Stdout {
        &mut self.stdout
    }

    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        self.fullscreen = !self.fullscreen;
        if self.fullscreen {
            self.stdout.write_all(b"\x1b[10;1t")?;
        } else {
            self.stdout.write_all(b"\x1b[10;0t")?;
        }
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.fullscreen {
            let _ = self.stdout.write_all(b"\x1b[10;0t");
        }
        let _ = execute!(self.stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Screen rectangle a grid is painted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    fn contains(&self, gx: usize, gy: usize) -> bool {
        gx < self.width as usize && gy < self.height as usize
    }
}

/// Blank the viewport.
pub fn clear_viewport<W: Write>(out: &mut W, view: Viewport) -> Result<()> {
    let blank = " ".repeat(view.width as usize);
    for dy in 0..view.height {
        queue!(out, cursor::MoveTo(view.x, view.y + dy), style::Print(&blank))?;
    }
    Ok(())
}

/// Paint a whole grid, clipped to the viewport.
pub fn paint_grid<W: Write>(out: &mut W, grid: &Grid, view: Viewport) -> Result<()> {
    for (gy, row) in grid.iter().enumerate() {
        if gy >= view.height as usize {
            break;
        }
        queue!(out, cursor::MoveTo(view.x, view.y + gy as u16))?;
        for (gx, cell) in row.iter().enumerate() {
            if gx >= view.width as usize {
                break;
            }
            let cs = to_content_style(&cell.style);
            queue!(
                out,
                style::PrintStyledContent(style::StyledContent::new(cs, cell.ch))
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Paint only the changed cells that fall inside the viewport.
pub fn paint_changes<W: Write>(out: &mut W, changes: &[CellChange], view: Viewport) -> Result<()> {
    for change in changes {
        if !view.contains(change.x as usize, change.y as usize) {
            continue;
        }
        let cs = to_content_style(&change.cell.style);
        queue!(
            out,
            cursor::MoveTo(view.x + change.x, view.y + change.y),
            style::PrintStyledContent(style::StyledContent::new(cs, change.cell.ch)),
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Print a dim status line on row `y`, truncated to `width`.
pub fn paint_status<W: Write>(out: &mut W, y: u16, width: u16, text: &str) -> Result<()> {
    let line: String = text.chars().take(width as usize).collect();
    let mut cs = style::ContentStyle::default();
    cs.attributes.set(style::Attribute::Dim);
    queue!(
        out,
        cursor::MoveTo(0, y),
        terminal::Clear(terminal::ClearType::CurrentLine),
        style::PrintStyledContent(style::StyledContent::new(cs, line)),
    )?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::cell::Cell;

    fn cell(ch: char) -> Cell {
        Cell {
            ch,
            ..Cell::default()
        }
    }

    #[test]
    fn grid_is_clipped_to_viewport() {
        let grid = vec![vec![cell('a'), cell('b'), cell('c')], vec![cell('d'); 3]];
        let view = Viewport {
            x: 0,
            y: 1,
            width: 2,
            height: 1,
        };
        let mut buf = Vec::new();
        paint_grid(&mut buf, &grid, view).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains('a') && out.contains('b'));
        assert!(!out.contains('c') && !out.contains('d'));
    }

    #[test]
    fn changes_outside_viewport_are_skipped() {
        let changes = vec![
            CellChange { x: 0, y: 0, cell: cell('x') },
            CellChange { x: 9, y: 0, cell: cell('y') },
        ];
        let view = Viewport {
            x: 0,
            y: 0,
            width: 4,
            height: 4,
        };
        let mut buf = Vec::new();
        paint_changes(&mut buf, &changes, view).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains('x'));
        assert!(!out.contains('y'));
    }
}
