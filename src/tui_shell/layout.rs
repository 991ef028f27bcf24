use crate::display::GRID_SLOTS;

use super::*;

const GRID_COLUMNS: u32 = 5;
const GRID_ROWS: u32 = (GRID_SLOTS as u32).div_ceil(GRID_COLUMNS);
const CELL_HEIGHT: u16 = 4;

pub(super) struct Panes {
    pub(super) header: Rect,
    pub(super) list: Rect,
    pub(super) grid: Rect,
    pub(super) detail: Rect,
    pub(super) status: Rect,
}

pub(super) fn panes(area: Rect) -> Panes {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(area);
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[1]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2 + CELL_HEIGHT * GRID_ROWS as u16),
            Constraint::Min(0),
        ])
        .split(body[1]);
    Panes {
        header: rows[0],
        list: body[0],
        grid: right[0],
        detail: right[1],
        status: rows[2],
    }
}

/// Screen rectangles of the grid slots, row-major, inside the grid pane border.
pub(super) fn grid_cells(grid: Rect) -> Vec<Rect> {
    let inner = Block::default().borders(Borders::ALL).inner(grid);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, GRID_ROWS); GRID_ROWS as usize])
        .split(inner);
    rows.iter()
        .flat_map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, GRID_COLUMNS); GRID_COLUMNS as usize])
                .split(*row)
                .to_vec()
        })
        .take(GRID_SLOTS)
        .collect()
}

/// Slot under the terminal cell (`column`, `row`), if any.
pub(super) fn slot_at(grid: Rect, column: u16, row: u16) -> Option<usize> {
    grid_cells(grid).iter().position(|cell| {
        column >= cell.x
            && column < cell.x.saturating_add(cell.width)
            && row >= cell.y
            && row < cell.y.saturating_add(cell.height)
    })
}

#[cfg(test)]
#[path = "../tests/tui_shell/layout_tests.rs"]
mod tests;
