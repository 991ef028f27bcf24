pub mod drag;
pub mod grid;

pub use self::drag::{DragController, DropIntent, SlotVisual};
pub use self::grid::{DisplayGrid, GRID_SLOTS, GridLoad, GridMove, PendingMove, Settle};
