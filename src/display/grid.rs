//! Fixed-size display grid.
//!
//! The grid has exactly [`GRID_SLOTS`] slots. After a load it changes only
//! through [`DisplayGrid::begin`] and [`DisplayGrid::settle`]. A move is
//! applied optimistically, then committed or rolled back to the exact
//! pre-move slots when the server answers. A reload that lands while a move is
//! pending wins; the late confirmation is reported as [`Settle::Stale`].
//!
//! Activating a displayed rocket fetches its detail lazily. Fetched content
//! follows the rocket across moves, rollbacks and reloads.

use std::collections::{HashMap, HashSet};

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::chest::DetailOutcome;
use crate::error::{CoreError, RemoteError};
use crate::gate::{RequestGate, RequestToken};
use crate::lock::{self, LockState};
use crate::model::{DetailState, ItemId, Origin, Rocket, RocketDetail};
use crate::remote::RocketApi;

pub const GRID_SLOTS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridMove {
    Swap { source: usize, target: usize },
    MoveToEmpty { source: usize, target: usize },
}

impl GridMove {
    pub fn source(self) -> usize {
        match self {
            GridMove::Swap { source, .. } | GridMove::MoveToEmpty { source, .. } => source,
        }
    }

    pub fn target(self) -> usize {
        match self {
            GridMove::Swap { target, .. } | GridMove::MoveToEmpty { target, .. } => target,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum MoveRequest {
    Swap { source: ItemId, target: ItemId },
    MoveToEmpty { id: ItemId, target: usize },
}

/// An optimistic move waiting for the server. Cheap to send to a worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingMove {
    seq: u64,
    mv: GridMove,
    request: MoveRequest,
}

impl PendingMove {
    pub fn mv(&self) -> GridMove {
        self.mv
    }

    /// Issues the remote call for this move. Does not touch the grid.
    pub fn dispatch<A: RocketApi + ?Sized>(&self, api: &A) -> Result<(), RemoteError> {
        match &self.request {
            MoveRequest::Swap { source, target } => api.swap_displays(source, target),
            MoveRequest::MoveToEmpty { id, target } => api.move_display(id, *target),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settle {
    Committed,
    RolledBack,
    /// The grid was reloaded after this move began; reload again to reconcile.
    Stale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridLoad {
    Applied { placed: usize, dropped: usize },
    Stale,
}

#[derive(Debug)]
struct InFlight {
    seq: u64,
    before: Vec<Option<Rocket>>,
}

#[derive(Debug)]
pub struct DisplayGrid {
    slots: Vec<Option<Rocket>>,
    gate: RequestGate,
    in_flight: Option<InFlight>,
    next_seq: u64,
    detail_gates: HashMap<ItemId, RequestGate>,
}

impl Default for DisplayGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayGrid {
    pub fn new() -> Self {
        Self {
            slots: vec![None; GRID_SLOTS],
            gate: RequestGate::new(),
            in_flight: None,
            next_seq: 0,
            detail_gates: HashMap::new(),
        }
    }

    pub fn slots(&self) -> &[Option<Rocket>] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Rocket> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn get(&self, id: &ItemId) -> Option<&Rocket> {
        self.slots.iter().flatten().find(|r| &r.id == id)
    }

    fn get_mut(&mut self, id: &ItemId) -> Option<&mut Rocket> {
        self.slots.iter_mut().flatten().find(|r| &r.id == id)
    }

    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|r| &r.id == id))
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn has_pending_move(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.gate.in_flight()
    }

    pub fn begin_load(&mut self) -> RequestToken {
        self.gate.issue()
    }

    pub fn finish_load(
        &mut self,
        token: RequestToken,
        result: Result<Vec<Rocket>, RemoteError>,
        now: OffsetDateTime,
    ) -> Result<GridLoad, CoreError> {
        if !self.gate.accept(token) {
            debug!(token = token.value(), "dropping stale display list response");
            return Ok(GridLoad::Stale);
        }
        let items = result?;
        Ok(self.apply_load(items, now))
    }

    pub fn load<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        now: OffsetDateTime,
    ) -> Result<GridLoad, CoreError> {
        let token = self.begin_load();
        let result = api.list(Origin::Display);
        self.finish_load(token, result, now)
    }

    /// Replaces the whole arrangement with a fresh server listing.
    ///
    /// Rockets keep their slot when it is valid and free. Rockets with no
    /// slot, an out-of-range slot or a taken slot go to the first empty slot.
    pub fn apply_load(&mut self, items: Vec<Rocket>, now: OffsetDateTime) -> GridLoad {
        if self.in_flight.take().is_some() {
            warn!("display grid reloaded while a move was pending");
        }

        let mut slots: Vec<Option<Rocket>> = vec![None; GRID_SLOTS];
        let mut seen = HashSet::new();
        let mut deferred = Vec::new();
        let mut dropped = 0;

        for mut rocket in items {
            if !seen.insert(rocket.id.clone()) {
                warn!(id = %rocket.id, "duplicate display item ignored");
                dropped += 1;
                continue;
            }
            if lock::evaluate(&rocket, now).state != LockState::Unlocked {
                warn!(id = %rocket.id, "locked rocket in display list ignored");
                dropped += 1;
                continue;
            }
            rocket.is_public = true;
            let location = rocket.display_location;
            match location {
                Some(i) if i < GRID_SLOTS && slots[i].is_none() => slots[i] = Some(rocket),
                _ => deferred.push(rocket),
            }
        }

        for mut rocket in deferred {
            match slots.iter().position(Option::is_none) {
                Some(i) => {
                    debug!(id = %rocket.id, wanted = ?rocket.display_location, slot = i, "placing display item in first empty slot");
                    rocket.display_location = Some(i);
                    slots[i] = Some(rocket);
                }
                None => {
                    warn!(id = %rocket.id, "display grid is full, item dropped");
                    dropped += 1;
                }
            }
        }

        let previous = std::mem::replace(&mut self.slots, slots);
        carry_details(previous, &mut self.slots);
        let slots = &self.slots;
        self.detail_gates
            .retain(|id, _| slots.iter().flatten().any(|r| &r.id == id));
        GridLoad::Applied {
            placed: self.occupied(),
            dropped,
        }
    }

    /// Validates `mv`, applies it optimistically and returns the handle to settle.
    pub fn begin(&mut self, mv: GridMove) -> Result<PendingMove, CoreError> {
        if self.in_flight.is_some() {
            return Err(CoreError::MoveInFlight);
        }
        let (source, target) = (mv.source(), mv.target());
        for index in [source, target] {
            if index >= GRID_SLOTS {
                return Err(CoreError::SlotOutOfRange(index));
            }
        }
        if source == target {
            return Err(CoreError::SameSlot(source));
        }

        let source_id = self.slots[source]
            .as_ref()
            .map(|r| r.id.clone())
            .ok_or(CoreError::SlotEmpty(source))?;
        let request = match mv {
            GridMove::Swap { .. } => {
                let target_id = self.slots[target]
                    .as_ref()
                    .map(|r| r.id.clone())
                    .ok_or(CoreError::SlotEmpty(target))?;
                MoveRequest::Swap {
                    source: source_id,
                    target: target_id,
                }
            }
            GridMove::MoveToEmpty { .. } => {
                if self.slots[target].is_some() {
                    return Err(CoreError::SlotOccupied(target));
                }
                MoveRequest::MoveToEmpty {
                    id: source_id,
                    target,
                }
            }
        };

        let before = self.slots.clone();
        match mv {
            GridMove::Swap { .. } => self.slots.swap(source, target),
            GridMove::MoveToEmpty { .. } => {
                let moved = self.slots[source].take();
                self.slots[target] = moved;
            }
        }
        self.renumber();

        self.next_seq += 1;
        let seq = self.next_seq;
        self.in_flight = Some(InFlight { seq, before });
        debug!(?mv, seq, "display move applied optimistically");
        Ok(PendingMove { seq, mv, request })
    }

    /// Commits or rolls back `pending` according to the server's answer.
    pub fn settle(&mut self, pending: &PendingMove, result: &Result<(), RemoteError>) -> Settle {
        let flight = match self.in_flight.take() {
            Some(flight) if flight.seq == pending.seq => flight,
            other => {
                self.in_flight = other;
                debug!(seq = pending.seq, "display move settled after a reload");
                return Settle::Stale;
            }
        };
        match result {
            Ok(()) => {
                info!(mv = ?pending.mv, "display move confirmed");
                Settle::Committed
            }
            Err(err) => {
                warn!(mv = ?pending.mv, error = %err, "display move rejected, rolling back");
                let moved = std::mem::replace(&mut self.slots, flight.before);
                carry_details(moved, &mut self.slots);
                Settle::RolledBack
            }
        }
    }

    /// Runs a move end to end against `api`. The grid is back to its
    /// pre-move state when this returns an error.
    pub fn run<A: RocketApi + ?Sized>(&mut self, api: &A, mv: GridMove) -> Result<Settle, CoreError> {
        let pending = self.begin(mv)?;
        let result = pending.dispatch(api);
        let settle = self.settle(&pending, &result);
        result?;
        Ok(settle)
    }

    pub fn swap<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        source: usize,
        target: usize,
    ) -> Result<Settle, CoreError> {
        self.run(api, GridMove::Swap { source, target })
    }

    pub fn move_to_empty<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        source: usize,
        target: usize,
    ) -> Result<Settle, CoreError> {
        self.run(api, GridMove::MoveToEmpty { source, target })
    }

    /// Marks the displayed rocket as loading and returns the token for the fetch.
    pub fn begin_detail(&mut self, id: &ItemId) -> Result<RequestToken, CoreError> {
        let rocket = self
            .get_mut(id)
            .ok_or_else(|| CoreError::UnknownItem(id.clone()))?;
        rocket.detail = DetailState::Loading;
        Ok(self.detail_gates.entry(id.clone()).or_default().issue())
    }

    /// Merges a detail response into the displayed rocket, wherever it sits
    /// now. On failure the summary stays and is marked [`DetailState::Failed`].
    pub fn finish_detail(
        &mut self,
        id: &ItemId,
        token: RequestToken,
        result: Result<RocketDetail, RemoteError>,
    ) -> Result<DetailOutcome, CoreError> {
        let current = self
            .detail_gates
            .get_mut(id)
            .is_some_and(|gate| gate.accept(token));
        if !current {
            debug!(id = %id, "dropping stale display detail response");
            return Ok(DetailOutcome::Stale);
        }
        let Some(rocket) = self.get_mut(id) else {
            return Ok(DetailOutcome::Stale);
        };
        match result {
            Ok(detail) => {
                rocket.merge_detail(detail);
                Ok(DetailOutcome::Loaded)
            }
            Err(err) => {
                rocket.detail = DetailState::Failed;
                Err(err.into())
            }
        }
    }

    pub fn load_detail<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        id: &ItemId,
    ) -> Result<DetailOutcome, CoreError> {
        let token = self.begin_detail(id)?;
        let result = api.detail(Origin::Display, id);
        self.finish_detail(id, token, result)
    }

    /// Dropping a rocket onto its own slot changes nothing.
    pub fn drop_same_slot(&self, index: usize) {
        debug!(slot = index, "drop on source slot ignored");
    }

    /// No duplicate ids, and every rocket's location matches its slot.
    pub fn is_consistent(&self) -> bool {
        let mut ids = HashSet::new();
        self.slots.iter().enumerate().all(|(i, slot)| match slot {
            None => true,
            Some(r) => r.display_location == Some(i) && ids.insert(r.id.clone()),
        })
    }

    fn renumber(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(rocket) = slot {
                rocket.display_location = Some(i);
            }
        }
    }
}

/// Copies fetched detail from `from` onto the same rockets in `into` when the
/// copy there has none. A fetch still running stays marked as loading.
fn carry_details(from: Vec<Option<Rocket>>, into: &mut [Option<Rocket>]) {
    let mut known: HashMap<ItemId, Rocket> = from
        .into_iter()
        .flatten()
        .filter(|r| matches!(r.detail, DetailState::Loaded | DetailState::Loading))
        .map(|r| (r.id.clone(), r))
        .collect();
    for rocket in into.iter_mut().flatten() {
        if rocket.detail == DetailState::Loaded {
            continue;
        }
        let Some(old) = known.remove(&rocket.id) else {
            continue;
        };
        if old.detail == DetailState::Loaded {
            rocket.content = old.content;
            rocket.attachments = old.attachments;
        }
        rocket.detail = old.detail;
    }
}

#[cfg(test)]
#[path = "../tests/display/grid_tests.rs"]
mod tests;
