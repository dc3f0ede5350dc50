//! Board renderer: the pure projection from playback data to cells.
//!
//! `project` and `project_font` turn a `PlaybackState` or a `FontRender`
//! into a nested `Display` (rows of panels of dot rows). `rasterize` lays a
//! display out onto a rectangular cell grid, and `diff` finds what changed
//! between two grids so the viewer only repaints those cells.
//!
//! Nothing here knows about time, terminals, or the network. Given the same
//! input, every function returns the same output.

pub mod cell;

use crate::config::DisplayConfig;
use crate::types::{Board, FontRender, PlaybackState};

use cell::{Cell, CellChange, Grid, Style};

/// One board slot in the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub name: Option<String>,
    pub dots: Vec<Vec<bool>>,
    /// The layout named a board the frame did not contain.
    pub missing: bool,
}

impl Panel {
    fn from_board(name: Option<String>, board: &Board) -> Self {
        Panel {
            name,
            dots: board.rows.clone(),
            missing: false,
        }
    }

    fn width(&self) -> usize {
        self.dots.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn height(&self) -> usize {
        self.dots.len()
    }
}

/// Rows of panels, in layout order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Display {
    pub rows: Vec<Vec<Panel>>,
}

pub struct BoardRenderer;

impl BoardRenderer {
    /// Project a playback state through its layout. Unknown board names
    /// become empty panels.
    pub fn project(state: &PlaybackState) -> Display {
        let rows = state
            .layout
            .rows()
            .iter()
            .map(|layout_row| {
                layout_row
                    .iter()
                    .map(|name| match state.boards.get(name) {
                        Some(board) => Panel::from_board(Some(name.clone()), board),
                        None => Panel {
                            name: Some(name.clone()),
                            dots: Vec::new(),
                            missing: true,
                        },
                    })
                    .collect()
            })
            .collect();
        Display { rows }
    }

    /// Project a font render: one display row per line, one panel per board
    /// on that line.
    pub fn project_font(render: &FontRender) -> Display {
        let rows = render
            .lines()
            .into_iter()
            .map(|line| {
                line.into_iter()
                    .map(|board| Panel::from_board(None, board))
                    .collect()
            })
            .collect();
        Display { rows }
    }

    /// Lay a display out on a cell grid.
    ///
    /// Panels in a row are top-aligned and separated by `panel_gap` blank
    /// columns; rows are separated by `row_gap` blank lines. Every dot is one
    /// cell, plus a blank spacer when `spaced` is set. A missing panel stays
    /// blank but keeps the width of the widest board in its layout column.
    pub fn rasterize(display: &Display, style: &DisplayConfig) -> Grid {
        let dot_w = if style.spaced { 2 } else { 1 };
        let panel_gap = style.panel_gap as usize;
        let row_gap = style.row_gap as usize;

        let column_width = |col: usize| {
            display
                .rows
                .iter()
                .filter_map(|row| row.get(col))
                .filter(|p| !p.missing)
                .map(Panel::width)
                .max()
                .unwrap_or(0)
        };
        // Width in dots of every slot, row by row.
        let slots: Vec<Vec<usize>> = display
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(col, p)| if p.missing { column_width(col) } else { p.width() })
                    .collect()
            })
            .collect();

        let row_height = |row: &Vec<Panel>| row.iter().map(Panel::height).max().unwrap_or(0);
        let row_width = |widths: &Vec<usize>| {
            widths.iter().map(|w| w * dot_w).sum::<usize>() + panel_gap * widths.len().saturating_sub(1)
        };

        let width = slots.iter().map(row_width).max().unwrap_or(0);
        let height = display.rows.iter().map(row_height).sum::<usize>()
            + row_gap * display.rows.len().saturating_sub(1);

        let on = Cell {
            ch: style.on,
            style: Style {
                fg: style.on_color.clone(),
                bold: true,
                dim: false,
            },
        };
        let off = Cell {
            ch: style.off,
            style: Style {
                fg: None,
                bold: false,
                dim: true,
            },
        };

        let mut grid = vec![vec![Cell::default(); width]; height];
        let mut top = 0;
        for (row, widths) in display.rows.iter().zip(&slots) {
            let mut left = 0;
            for (panel, slot) in row.iter().zip(widths) {
                for (dy, dots) in panel.dots.iter().enumerate() {
                    for (dx, &dot) in dots.iter().enumerate() {
                        grid[top + dy][left + dx * dot_w] = if dot { on.clone() } else { off.clone() };
                    }
                }
                left += slot * dot_w + panel_gap;
            }
            top += row_height(row) + row_gap;
        }

        grid
    }

    /// Cell-level diff between two grids of the same size.
    pub fn diff(prev: &Grid, next: &Grid) -> Vec<CellChange> {
        let mut changes = Vec::new();
        for (y, (prev_row, next_row)) in prev.iter().zip(next.iter()).enumerate() {
            for (x, (prev_cell, next_cell)) in prev_row.iter().zip(next_row.iter()).enumerate() {
                if prev_cell != next_cell {
                    changes.push(CellChange {
                        x: x as u16,
                        y: y as u16,
                        cell: next_cell.clone(),
                    });
                }
            }
        }
        changes
    }

    /// Plain-text form of a grid, with trailing blanks trimmed per line.
    pub fn to_text(grid: &Grid) -> String {
        grid.iter()
            .map(|row| {
                let line: String = row.iter().map(|c| c.ch).collect();
                line.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::types::Layout;

    fn board(rows: &[&[bool]]) -> Board {
        Board::new(rows.iter().map(|r| r.to_vec()).collect())
    }

    fn plain() -> DisplayConfig {
        DisplayConfig {
            on: '#',
            off: '.',
            on_color: None,
            spaced: false,
            panel_gap: 1,
            row_gap: 0,
        }
    }

    fn quad_state() -> PlaybackState {
        let layout = Layout(vec![
            vec!["A".into(), "B".into()],
            vec!["C".into(), "D".into()],
        ]);
        let boards = HashMap::from([
            ("A".to_string(), board(&[&[true, false]])),
            ("B".to_string(), board(&[&[false, true]])),
            ("C".to_string(), board(&[&[true, true]])),
            ("D".to_string(), board(&[&[false, false]])),
        ]);
        PlaybackState {
            layout,
            boards,
            frame_index: 0,
            frame_count: 1,
        }
    }

    #[test]
    fn quad_layout_projects_in_row_major_order() {
        let display = BoardRenderer::project(&quad_state());
        let dots: Vec<Vec<Vec<Vec<bool>>>> = display
            .rows
            .iter()
            .map(|row| row.iter().map(|p| p.dots.clone()).collect())
            .collect();
        assert_eq!(
            dots,
            vec![
                vec![vec![vec![true, false]], vec![vec![false, true]]],
                vec![vec![vec![true, true]], vec![vec![false, false]]],
            ]
        );
        let names: Vec<_> = display.rows.iter().flatten().map(|p| p.name.clone().unwrap()).collect();
        assert_eq!(names, ["A", "B", "C", "D"]);
    }

    #[test]
    fn quad_layout_rasterizes_to_text() {
        let grid = BoardRenderer::rasterize(&BoardRenderer::project(&quad_state()), &plain());
        assert_eq!(BoardRenderer::to_text(&grid), "#. .#\n## ..");
    }

    #[test]
    fn rendering_is_idempotent() {
        let state = quad_state();
        let style = DisplayConfig::default();
        let first = BoardRenderer::rasterize(&BoardRenderer::project(&state), &style);
        let second = BoardRenderer::rasterize(&BoardRenderer::project(&state), &style);
        assert_eq!(first, second);
        assert!(BoardRenderer::diff(&first, &second).is_empty());
    }

    #[test]
    fn missing_board_renders_an_empty_cell() {
        let mut state = quad_state();
        state.boards.remove("B");

        let display = BoardRenderer::project(&state);
        let b = &display.rows[0][1];
        assert!(b.missing);
        assert!(b.dots.is_empty());

        let grid = BoardRenderer::rasterize(&display, &plain());
        assert_eq!(BoardRenderer::to_text(&grid), "#.\n## ..");
    }

    #[test]
    fn missing_board_keeps_its_slot() {
        let mut state = quad_state();
        state.boards.remove("A");

        let grid = BoardRenderer::rasterize(&BoardRenderer::project(&state), &plain());
        assert_eq!(BoardRenderer::to_text(&grid), "   .#\n## ..");
        assert_eq!(grid[0][0], Cell::default());
    }

    #[test]
    fn lettered_font_places_letters_side_by_side() {
        let render = FontRender::Lettered(vec![
            vec![board(&[&[true], &[true]]), board(&[&[false, true]])],
            vec![board(&[&[true, true, true]])],
        ]);
        let mut style = plain();
        style.row_gap = 1;

        let grid = BoardRenderer::rasterize(&BoardRenderer::project_font(&render), &style);
        assert_eq!(BoardRenderer::to_text(&grid), "# .#\n#\n\n###");
    }

    #[test]
    fn empty_font_render_is_an_empty_grid() {
        let grid = BoardRenderer::rasterize(
            &BoardRenderer::project_font(&FontRender::default()),
            &DisplayConfig::default(),
        );
        assert!(grid.iter().all(|row| row.is_empty()));
        assert_eq!(BoardRenderer::to_text(&grid), "");
    }

    #[test]
    fn spaced_dots_leave_a_blank_column() {
        let render = FontRender::Single(board(&[&[true, false]]));
        let mut style = plain();
        style.spaced = true;

        let grid = BoardRenderer::rasterize(&BoardRenderer::project_font(&render), &style);
        assert_eq!(grid[0].len(), 4);
        assert_eq!(BoardRenderer::to_text(&grid), "# .");
    }

    #[test]
    fn diff_reports_only_flipped_dots() {
        let style = plain();
        let before = BoardRenderer::rasterize(
            &BoardRenderer::project_font(&FontRender::Single(board(&[&[true, false]]))),
            &style,
        );
        let after = BoardRenderer::rasterize(
            &BoardRenderer::project_font(&FontRender::Single(board(&[&[true, true]]))),
            &style,
        );
        let changes = BoardRenderer::diff(&before, &after);
        assert_eq!(changes.len(), 1);
        assert_eq!((changes[0].x, changes[0].y), (1, 0));
        assert_eq!(changes[0].cell.ch, '#');
    }
}
