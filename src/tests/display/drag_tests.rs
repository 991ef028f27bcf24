use super::*;

use crate::test_support::{displayed, t0};

fn grid() -> DisplayGrid {
    let mut grid = DisplayGrid::new();
    grid.apply_load(
        vec![displayed("r1", Some(0)), displayed("r2", Some(2))],
        t0(),
    );
    grid
}

#[test]
fn empty_slot_cannot_be_picked_up() {
    let grid = grid();
    let mut drag = DragController::new();
    assert!(!drag.drag_start(&grid, 1));
    assert!(!drag.drag_start(&grid, 42));
    assert!(!drag.is_dragging());
}

#[test]
fn one_drag_at_a_time() {
    let grid = grid();
    let mut drag = DragController::new();
    assert!(drag.drag_start(&grid, 0));
    assert!(!drag.drag_start(&grid, 2));
    assert_eq!(drag.source(), Some(0));
}

#[test]
fn drop_on_occupied_slot_is_a_swap() {
    let grid = grid();
    let mut drag = DragController::new();
    drag.drag_start(&grid, 0);
    drag.drag_over(2);
    assert_eq!(drag.visual(0), SlotVisual::Dragging);
    assert_eq!(drag.visual(2), SlotVisual::DragOver);
    assert_eq!(drag.visual(1), SlotVisual::Idle);

    assert_eq!(
        drag.drop_on(&grid, 2),
        DropIntent::Move(GridMove::Swap {
            source: 0,
            target: 2
        })
    );
    assert!(!drag.is_dragging());
    assert!((0..GRID_SLOTS).all(|i| drag.visual(i) == SlotVisual::Idle));
}

#[test]
fn drop_on_empty_slot_is_a_move() {
    let grid = grid();
    let mut drag = DragController::new();
    drag.drag_start(&grid, 2);
    assert_eq!(
        drag.drop_on(&grid, 1),
        DropIntent::Move(GridMove::MoveToEmpty {
            source: 2,
            target: 1
        })
    );
}

#[test]
fn drop_on_source_or_outside_cancels() {
    let grid = grid();
    let mut drag = DragController::new();
    drag.drag_start(&grid, 0);
    assert_eq!(drag.drop_on(&grid, 0), DropIntent::Cancel);
    assert!(!drag.is_dragging());

    drag.drag_start(&grid, 0);
    assert_eq!(drag.drop_on(&grid, GRID_SLOTS), DropIntent::Cancel);
}

#[test]
fn drop_without_drag_is_ignored() {
    let grid = grid();
    let mut drag = DragController::new();
    assert_eq!(drag.drop_on(&grid, 1), DropIntent::Ignored);
}

#[test]
fn source_slot_never_shows_drag_over() {
    let grid = grid();
    let mut drag = DragController::new();
    drag.drag_over(3);
    assert_eq!(drag.over(), None);

    drag.drag_start(&grid, 0);
    drag.drag_over(0);
    assert_eq!(drag.over(), None);
    drag.drag_over(3);
    assert_eq!(drag.over(), Some(3));
    drag.drag_leave(4);
    assert_eq!(drag.over(), Some(3));
    drag.drag_leave(3);
    assert_eq!(drag.over(), None);
}

#[test]
fn drag_end_clears_everything() {
    let grid = grid();
    let mut drag = DragController::new();
    drag.drag_start(&grid, 2);
    drag.drag_over(5);
    drag.drag_end();
    assert!(!drag.is_dragging());
    assert_eq!(drag.over(), None);
    assert_eq!(drag.visual(2), SlotVisual::Idle);
}

#[test]
fn grid_reload_under_the_drag_cancels_the_drop() {
    let mut grid = grid();
    let mut drag = DragController::new();
    drag.drag_start(&grid, 0);
    grid.apply_load(vec![displayed("other", Some(0))], t0());
    assert_eq!(drag.drop_on(&grid, 1), DropIntent::Cancel);
}
