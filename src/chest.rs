//! One chest list (own, received, sent or group rockets).
//!
//! Holds the fetched summaries and the local halves of the per-item commands.
//! Unlock and visibility are split into a check half and an apply half; the
//! [`Dashboard`](crate::dashboard::Dashboard) runs the network call between
//! them and reloads the grid where needed.

use std::collections::HashMap;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::error::{CoreError, RemoteError};
use crate::gate::{RequestGate, RequestToken};
use crate::lock::{self, LockState};
use crate::model::{DetailState, ItemId, Origin, Rocket, RocketDetail, RocketId};
use crate::remote::RocketApi;
use crate::store::UnlockedSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListLoad {
    Applied {
        count: usize,
        /// Items shown unlocked only because of the local unlocked set.
        masked: usize,
        /// Unlocked-set entries dropped because the server caught up.
        pruned: usize,
    },
    Stale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetailOutcome {
    Loaded,
    Stale,
}

#[derive(Debug)]
pub struct ChestBook {
    origin: Origin,
    items: Vec<Rocket>,
    gate: RequestGate,
    detail_gates: HashMap<ItemId, RequestGate>,
}

impl ChestBook {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            items: Vec::new(),
            gate: RequestGate::new(),
            detail_gates: HashMap::new(),
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn items(&self) -> &[Rocket] {
        &self.items
    }

    pub fn get(&self, id: &ItemId) -> Option<&Rocket> {
        self.items.iter().find(|r| &r.id == id)
    }

    fn get_mut(&mut self, id: &ItemId) -> Result<&mut Rocket, CoreError> {
        self.items
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| CoreError::UnknownItem(id.clone()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
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
        unlocked: &mut UnlockedSet,
    ) -> Result<ListLoad, CoreError> {
        if !self.gate.accept(token) {
            debug!(list = %self.origin, token = token.value(), "dropping stale list response");
            return Ok(ListLoad::Stale);
        }
        let items = result?;
        Ok(self.apply_load(items, unlocked))
    }

    pub fn load<A: RocketApi + ?Sized>(
        &mut self,
        api: &A,
        unlocked: &mut UnlockedSet,
    ) -> Result<ListLoad, CoreError> {
        let token = self.begin_load();
        let result = api.list(self.origin);
        self.finish_load(token, result, unlocked)
    }

    /// Replaces the list. Manually unlocked rockets the server still reports
    /// as locked stay unlocked; entries the server confirms are pruned.
    pub fn apply_load(&mut self, items: Vec<Rocket>, unlocked: &mut UnlockedSet) -> ListLoad {
        let mut previous: HashMap<ItemId, Rocket> =
            self.items.drain(..).map(|r| (r.id.clone(), r)).collect();
        let mut masked = 0;
        let mut confirmed: Vec<RocketId> = Vec::new();

        let mut fresh = items;
        for rocket in &mut fresh {
            if unlocked.contains(&rocket.rocket_id) {
                if rocket.is_locked {
                    rocket.is_locked = false;
                    masked += 1;
                } else {
                    confirmed.push(rocket.rocket_id.clone());
                }
            }
            if rocket.detail == DetailState::NotLoaded
                && let Some(old) = previous.remove(&rocket.id)
                && old.detail == DetailState::Loaded
            {
                rocket.content = old.content;
                rocket.attachments = old.attachments;
                rocket.detail = DetailState::Loaded;
            }
        }

        let pruned = match unlocked.prune(&confirmed) {
            Ok(n) => n,
            Err(err) => {
                warn!(error = %format!("{:#}", err), "could not prune unlocked set");
                0
            }
        };

        self.detail_gates
            .retain(|id, _| fresh.iter().any(|r| &r.id == id));
        self.items = fresh;
        debug!(list = %self.origin, count = self.items.len(), masked, pruned, "list loaded");
        ListLoad::Applied {
            count: self.items.len(),
            masked,
            pruned,
        }
    }

    /// Local precondition for an unlock: the rocket must be UNLOCKABLE right now.
    pub fn check_unlock(&self, id: &ItemId, now: OffsetDateTime) -> Result<RocketId, CoreError> {
        let rocket = self
            .get(id)
            .ok_or_else(|| CoreError::UnknownItem(id.clone()))?;
        let state = lock::evaluate(rocket, now).state;
        if state != LockState::Unlockable {
            return Err(CoreError::NotUnlockable {
                id: id.clone(),
                state,
            });
        }
        Ok(rocket.rocket_id.clone())
    }

    /// Records a confirmed unlock. Display placement is left alone.
    ///
    /// The rocket stays open in memory even when the unlocked set cannot be
    /// written; that failure is returned as [`CoreError::Storage`].
    pub fn apply_unlock(
        &mut self,
        id: &ItemId,
        now: OffsetDateTime,
        unlocked: &mut UnlockedSet,
    ) -> Result<(), CoreError> {
        let rocket = self.get_mut(id)?;
        rocket.is_locked = false;
        rocket.opened_at = Some(now);
        let rocket_id = rocket.rocket_id.clone();
        info!(list = %self.origin, id = %id, rocket = %rocket_id, "rocket unlocked");
        unlocked.insert(rocket_id.clone()).map_err(|err| {
            warn!(rocket = %rocket_id, error = %format!("{:#}", err), "could not record unlock locally");
            CoreError::Storage(err)
        })?;
        Ok(())
    }

    /// Local precondition for a visibility toggle: a received rocket that is
    /// UNLOCKED right now.
    pub fn check_visibility(&self, id: &ItemId, now: OffsetDateTime) -> Result<(), CoreError> {
        if self.origin != Origin::Received {
            return Err(CoreError::Unsupported("this list"));
        }
        let rocket = self
            .get(id)
            .ok_or_else(|| CoreError::UnknownItem(id.clone()))?;
        let state = lock::evaluate(rocket, now).state;
        if state != LockState::Unlocked {
            return Err(CoreError::NotDisplayable {
                id: id.clone(),
                state,
            });
        }
        Ok(())
    }

    pub fn apply_visibility(&mut self, id: &ItemId, is_public: bool) -> Result<(), CoreError> {
        let rocket = self.get_mut(id)?;
        rocket.is_public = is_public;
        if !is_public {
            rocket.display_location = None;
        }
        info!(id = %id, is_public, "visibility changed");
        Ok(())
    }

    /// Marks the summary as loading and returns the token for the fetch.
    pub fn begin_detail(&mut self, id: &ItemId) -> Result<RequestToken, CoreError> {
        let rocket = self.get_mut(id)?;
        rocket.detail = DetailState::Loading;
        Ok(self.detail_gates.entry(id.clone()).or_default().issue())
    }

    /// Merges a detail response. On failure the summary stays and is marked
    /// [`DetailState::Failed`].
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
            debug!(id = %id, "dropping stale detail response");
            return Ok(DetailOutcome::Stale);
        }
        let Some(rocket) = self.items.iter_mut().find(|r| &r.id == id) else {
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
        let result = api.detail(self.origin, id);
        self.finish_detail(id, token, result)
    }
}

#[cfg(test)]
#[path = "tests/chest_tests.rs"]
mod tests;
