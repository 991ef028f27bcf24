//! Owns the chest lists, the display grid, the drag controller and the
//! locally-unlocked set, and sequences commands that touch more than one of
//! them (a visibility toggle reloads the grid, a drop runs a grid move).
//!
//! The `begin_*`/`finish_*` pairs let the TUI run the remote half on a worker
//! thread; the plain methods do the whole thing inline for the CLI and tests.

use std::collections::BTreeMap;

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::chest::{ChestBook, DetailOutcome, ListLoad};
use crate::display::{
    DisplayGrid, DragController, DropIntent, GridLoad, GridMove, PendingMove, Settle, SlotVisual,
};
use crate::error::{CoreError, RemoteError};
use crate::gate::RequestToken;
use crate::lock::{LockBoard, LockView, Transition};
use crate::model::{ItemId, Origin, Rocket, RocketDetail, RocketId};
use crate::remote::RocketApi;
use crate::store::UnlockedSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// No drag was active.
    Ignored,
    Cancelled,
    Settled(Settle),
}

#[derive(Debug)]
pub struct Dashboard {
    chests: BTreeMap<Origin, ChestBook>,
    grid: DisplayGrid,
    drag: DragController,
    unlocked: UnlockedSet,
    board: LockBoard,
}

impl Dashboard {
    pub fn new(unlocked: UnlockedSet) -> Self {
        let chests = Origin::CHESTS
            .into_iter()
            .map(|origin| (origin, ChestBook::new(origin)))
            .collect();
        Self {
            chests,
            grid: DisplayGrid::new(),
            drag: DragController::new(),
            unlocked,
            board: LockBoard::new(),
        }
    }

    pub fn chest(&self, origin: Origin) -> Result<&ChestBook, CoreError> {
        self.chests
            .get(&origin)
            .ok_or(CoreError::Unsupported("the display list"))
    }

    fn chest_mut(&mut self, origin: Origin) -> Result<&mut ChestBook, CoreError> {
        self.chests
            .get_mut(&origin)
            .ok_or(CoreError::Unsupported("the display list"))
    }

    pub fn grid(&self) -> &DisplayGrid {
        &self.grid
    }

    pub fn unlocked(&self) -> &UnlockedSet {
        &self.unlocked
    }

    pub fn lock_view(&self, id: &ItemId) -> Option<&LockView> {
        self.board.view(id)
    }

    // ---- lists --------------------------------------------------------

    pub fn begin_list(&mut self, origin: Origin) -> Result<RequestToken, CoreError> {
        Ok(self.chest_mut(origin)?.begin_load())
    }

    pub fn finish_list(
        &mut self,
        origin: Origin,
        token: RequestToken,
        result: Result<Vec<Rocket>, RemoteError>,
    ) -> Result<ListLoad, CoreError> {
        let book = self
            .chests
            .get_mut(&origin)
            .ok_or(CoreError::Unsupported("the display list"))?;
        book.finish_load(token, result, &mut self.unlocked)
    }

    pub fn refresh_list<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        origin: Origin,
    ) -> Result<ListLoad, CoreError> {
        let token = self.begin_list(origin)?;
        let result = api.list(origin);
        self.finish_list(origin, token, result)
    }

    pub fn begin_grid(&mut self) -> RequestToken {
        self.grid.begin_load()
    }

    pub fn finish_grid(
        &mut self,
        token: RequestToken,
        result: Result<Vec<Rocket>, RemoteError>,
        now: OffsetDateTime,
    ) -> Result<GridLoad, CoreError> {
        self.grid.finish_load(token, result, now)
    }

    pub fn refresh_grid<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        now: OffsetDateTime,
    ) -> Result<GridLoad, CoreError> {
        self.grid.load(api, now)
    }

    // ---- unlock -------------------------------------------------------

    pub fn check_unlock(
        &self,
        origin: Origin,
        id: &ItemId,
        now: OffsetDateTime,
    ) -> Result<RocketId, CoreError> {
        self.chest(origin)?.check_unlock(id, now)
    }

    pub fn apply_unlock(
        &mut self,
        origin: Origin,
        id: &ItemId,
        now: OffsetDateTime,
    ) -> Result<(), CoreError> {
        let book = self
            .chests
            .get_mut(&origin)
            .ok_or(CoreError::Unsupported("the display list"))?;
        book.apply_unlock(id, now, &mut self.unlocked)
    }

    pub fn unlock<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        origin: Origin,
        id: &ItemId,
        now: OffsetDateTime,
    ) -> Result<(), CoreError> {
        let rocket_id = self.check_unlock(origin, id, now)?;
        api.unlock(&rocket_id)?;
        self.apply_unlock(origin, id, now)
    }

    // ---- visibility ---------------------------------------------------

    pub fn check_visibility(&self, id: &ItemId, now: OffsetDateTime) -> Result<(), CoreError> {
        self.chest(Origin::Received)?.check_visibility(id, now)
    }

    /// Records the server's answer. The caller reloads the grid afterwards.
    pub fn apply_visibility(&mut self, id: &ItemId, is_public: bool) -> Result<(), CoreError> {
        self.chest_mut(Origin::Received)?
            .apply_visibility(id, is_public)
    }

    /// Flips a received rocket on or off the display and reloads the grid.
    pub fn toggle_visibility<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        id: &ItemId,
        now: OffsetDateTime,
    ) -> Result<bool, CoreError> {
        self.check_visibility(id, now)?;
        let is_public = api.toggle_visibility(id)?;
        self.apply_visibility(id, is_public)?;
        self.refresh_grid(api, now)?;
        Ok(is_public)
    }

    // ---- detail -------------------------------------------------------

    /// The rocket `id` as currently held for `origin`; the display origin
    /// looks in the grid.
    pub fn rocket(&self, origin: Origin, id: &ItemId) -> Option<&Rocket> {
        match origin {
            Origin::Display => self.grid.get(id),
            _ => self.chest(origin).ok()?.get(id),
        }
    }

    pub fn begin_detail(&mut self, origin: Origin, id: &ItemId) -> Result<RequestToken, CoreError> {
        match origin {
            Origin::Display => self.grid.begin_detail(id),
            _ => self.chest_mut(origin)?.begin_detail(id),
        }
    }

    pub fn finish_detail(
        &mut self,
        origin: Origin,
        id: &ItemId,
        token: RequestToken,
        result: Result<RocketDetail, RemoteError>,
    ) -> Result<DetailOutcome, CoreError> {
        match origin {
            Origin::Display => self.grid.finish_detail(id, token, result),
            _ => self.chest_mut(origin)?.finish_detail(id, token, result),
        }
    }

    /// Lazily fetches the body of a chest item or a displayed rocket.
    pub fn load_detail<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        origin: Origin,
        id: &ItemId,
    ) -> Result<DetailOutcome, CoreError> {
        match origin {
            Origin::Display => self.grid.load_detail(api, id),
            _ => self.chest_mut(origin)?.load_detail(api, id),
        }
    }

    // ---- drag and drop ------------------------------------------------

    pub fn drag_start(&mut self, index: usize) -> bool {
        self.drag.drag_start(&self.grid, index)
    }

    pub fn drag_over(&mut self, index: usize) {
        self.drag.drag_over(index);
    }

    pub fn drag_leave(&mut self, index: usize) {
        self.drag.drag_leave(index);
    }

    pub fn drag_end(&mut self) {
        self.drag.drag_end();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Slot currently marked as the drop target.
    pub fn drag_target(&self) -> Option<usize> {
        self.drag.over()
    }

    pub fn slot_visual(&self, index: usize) -> SlotVisual {
        self.drag.visual(index)
    }

    /// Ends the drag on `index` and applies the resulting move optimistically.
    /// Returns `None` when there is nothing to send. Drag flags are cleared
    /// on every path.
    pub fn begin_drop(&mut self, index: usize) -> Result<Option<PendingMove>, CoreError> {
        let source = self.drag.source();
        match self.drag.drop_on(&self.grid, index) {
            DropIntent::Ignored => Ok(None),
            DropIntent::Cancel => {
                if source == Some(index) {
                    self.grid.drop_same_slot(index);
                }
                Ok(None)
            }
            DropIntent::Move(mv) => self.grid.begin(mv).map(Some),
        }
    }

    /// Settles a move started by [`begin_drop`](Self::begin_drop). On
    /// [`Settle::Stale`] the caller reloads the grid.
    pub fn settle_move(&mut self, pending: &PendingMove, result: &Result<(), RemoteError>) -> Settle {
        self.grid.settle(pending, result)
    }

    pub fn drop_on<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        index: usize,
        now: OffsetDateTime,
    ) -> Result<DropOutcome, CoreError> {
        let was_dragging = self.drag.is_dragging();
        let Some(pending) = self.begin_drop(index)? else {
            return Ok(if was_dragging {
                DropOutcome::Cancelled
            } else {
                DropOutcome::Ignored
            });
        };
        self.dispatch_move(api, &pending, now)
            .map(DropOutcome::Settled)
    }

    /// Runs a swap or move-to-empty end to end. The grid is back to its
    /// pre-move slots when this returns an error.
    pub fn run_move<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        mv: GridMove,
        now: OffsetDateTime,
    ) -> Result<Settle, CoreError> {
        let pending = self.grid.begin(mv)?;
        self.dispatch_move(api, &pending, now)
    }

    fn dispatch_move<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        pending: &PendingMove,
        now: OffsetDateTime,
    ) -> Result<Settle, CoreError> {
        let result = pending.dispatch(api);
        let settle = self.settle_move(pending, &result);
        if settle == Settle::Stale {
            debug!("reloading grid after a stale move");
            self.refresh_grid(api, now)?;
        }
        result?;
        info!(mv = ?pending.mv(), "display rearranged");
        Ok(settle)
    }

    // ---- ticks --------------------------------------------------------

    /// Re-evaluates the lock state of every rocket in `visible` and returns
    /// the transitions since the previous tick.
    pub fn tick(&mut self, visible: Origin, now: OffsetDateTime) -> Vec<Transition> {
        let items = self
            .chests
            .get(&visible)
            .map(ChestBook::items)
            .unwrap_or_default();
        let transitions = self.board.refresh(items, now);
        for t in &transitions {
            debug!(id = %t.id, from = %t.from, to = %t.to, "lock state changed");
        }
        transitions
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
