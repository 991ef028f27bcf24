//! Drag-and-drop over the display grid.
//!
//! Tracks one active drag (source slot + dragged rocket) and the slot under
//! the pointer. It never writes to the grid: a drop yields a [`DropIntent`]
//! that the caller hands to [`DisplayGrid`](super::DisplayGrid).

use tracing::debug;

use super::grid::{DisplayGrid, GRID_SLOTS, GridMove};
use crate::model::ItemId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotVisual {
    Idle,
    Dragging,
    DragOver,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropIntent {
    /// No drag was active.
    Ignored,
    /// Dropped back on the source, or the grid changed under the drag.
    Cancel,
    Move(GridMove),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ActiveDrag {
    source: usize,
    rocket: ItemId,
}

#[derive(Debug, Default)]
pub struct DragController {
    active: Option<ActiveDrag>,
    over: Option<usize>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn source(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.source)
    }

    pub fn over(&self) -> Option<usize> {
        self.over
    }

    /// Starts dragging the rocket in `index`. Rejected for an empty slot or
    /// while another drag is active.
    pub fn drag_start(&mut self, grid: &DisplayGrid, index: usize) -> bool {
        if self.active.is_some() {
            return false;
        }
        let Some(rocket) = grid.slot(index) else {
            return false;
        };
        debug!(slot = index, id = %rocket.id, "drag started");
        self.active = Some(ActiveDrag {
            source: index,
            rocket: rocket.id.clone(),
        });
        self.over = None;
        true
    }

    /// Pointer moved over `index`. Only other slots get the drag-over mark.
    pub fn drag_over(&mut self, index: usize) {
        let Some(active) = &self.active else {
            return;
        };
        self.over = (index < GRID_SLOTS && index != active.source).then_some(index);
    }

    /// Pointer left `index` without dropping.
    pub fn drag_leave(&mut self, index: usize) {
        if self.over == Some(index) {
            self.over = None;
        }
    }

    /// Ends the drag on `index`. Transient state is cleared whatever the outcome.
    pub fn drop_on(&mut self, grid: &DisplayGrid, index: usize) -> DropIntent {
        self.over = None;
        let Some(active) = self.active.take() else {
            return DropIntent::Ignored;
        };
        if index == active.source || index >= GRID_SLOTS {
            return DropIntent::Cancel;
        }
        if grid.slot(active.source).map(|r| &r.id) != Some(&active.rocket) {
            debug!(source = active.source, "grid changed during drag, drop cancelled");
            return DropIntent::Cancel;
        }
        let mv = if grid.slot(index).is_some() {
            GridMove::Swap {
                source: active.source,
                target: index,
            }
        } else {
            GridMove::MoveToEmpty {
                source: active.source,
                target: index,
            }
        };
        DropIntent::Move(mv)
    }

    /// Drag released outside any slot, or abandoned.
    pub fn drag_end(&mut self) {
        if self.active.take().is_some() {
            debug!("drag ended without a drop");
        }
        self.over = None;
    }

    pub fn visual(&self, index: usize) -> SlotVisual {
        match &self.active {
            Some(active) if active.source == index => SlotVisual::Dragging,
            Some(_) if self.over == Some(index) => SlotVisual::DragOver,
            _ => SlotVisual::Idle,
        }
    }
}

#[cfg(test)]
#[path = "../tests/display/drag_tests.rs"]
mod tests;
