use super::*;

fn screen() -> Rect {
    Rect::new(0, 0, 120, 40)
}

#[test]
fn panes_tile_the_screen() {
    let p = panes(screen());
    assert_eq!(p.header.height, 2);
    assert_eq!(p.status.height, 4);
    assert_eq!(p.status.y + p.status.height, 40);
    assert_eq!(p.list.x, 0);
    assert_eq!(p.grid.x, p.list.width);
    assert_eq!(p.grid.height, 2 + CELL_HEIGHT * GRID_ROWS as u16);
    assert_eq!(p.detail.y, p.grid.y + p.grid.height);
}

#[test]
fn grid_has_one_cell_per_slot_in_two_rows() {
    let grid = panes(screen()).grid;
    let cells = grid_cells(grid);
    assert_eq!(cells.len(), GRID_SLOTS);
    assert!(cells[..5].iter().all(|c| c.y == cells[0].y));
    assert!(cells[5..].iter().all(|c| c.y > cells[0].y));
    assert!(cells.windows(2).take(4).all(|w| w[0].x < w[1].x));
}

#[test]
fn slot_at_maps_cells_and_misses_borders() {
    let grid = panes(screen()).grid;
    for (i, cell) in grid_cells(grid).iter().enumerate() {
        assert_eq!(slot_at(grid, cell.x, cell.y), Some(i));
        assert_eq!(
            slot_at(grid, cell.x + cell.width - 1, cell.y + cell.height - 1),
            Some(i)
        );
    }
    assert_eq!(slot_at(grid, grid.x, grid.y), None);
    assert_eq!(slot_at(grid, 0, 0), None);
}

#[test]
fn tiny_terminal_does_not_panic() {
    let p = panes(Rect::new(0, 0, 10, 5));
    let cells = grid_cells(p.grid);
    assert!(cells.len() <= GRID_SLOTS);
    let _ = slot_at(p.grid, 3, 3);
}
