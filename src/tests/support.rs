//! In-memory [`RocketApi`] and fixtures shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use time::OffsetDateTime;

use crate::error::RemoteError;
use crate::model::{ItemId, Origin, Profile, Rocket, RocketDetail, RocketId};
use crate::remote::RocketApi;

/// Fixed instant the tests measure from.
pub(crate) fn t0() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("valid timestamp")
}

pub(crate) fn at(secs: i64) -> OffsetDateTime {
    t0() + time::Duration::seconds(secs)
}

pub(crate) fn rocket(id: &str, origin: Origin) -> Rocket {
    Rocket::new(id, origin, &format!("rocket {}", id))
}

/// Unlocked display rocket asking for 0-based `slot`.
pub(crate) fn displayed(id: &str, slot: Option<usize>) -> Rocket {
    let mut r = rocket(id, Origin::Display);
    r.is_public = true;
    r.display_location = slot;
    r
}

pub(crate) fn rejected(reason: &str) -> RemoteError {
    RemoteError::Rejected {
        label: "test".to_string(),
        status: 409,
        reason: Some(reason.to_string()),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Calls {
    pub(crate) list: usize,
    pub(crate) detail: usize,
    pub(crate) unlock: usize,
    pub(crate) swap: usize,
    pub(crate) move_to_empty: usize,
    pub(crate) toggle: usize,
    pub(crate) download: usize,
}

impl Calls {
    pub(crate) fn total(&self) -> usize {
        self.list
            + self.detail
            + self.unlock
            + self.swap
            + self.move_to_empty
            + self.toggle
            + self.download
    }
}

#[derive(Default)]
struct FakeState {
    lists: HashMap<Origin, Vec<Rocket>>,
    details: HashMap<ItemId, RocketDetail>,
    public: HashSet<ItemId>,
    failing: HashMap<&'static str, RemoteError>,
    calls: Calls,
    unlocked: Vec<RocketId>,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn with_list(self, origin: Origin, items: Vec<Rocket>) -> Self {
        self.set_list(origin, items);
        self
    }

    pub(crate) fn set_list(&self, origin: Origin, items: Vec<Rocket>) {
        self.state().lists.insert(origin, items);
    }

    pub(crate) fn with_detail(self, id: &str, detail: RocketDetail) -> Self {
        self.state().details.insert(ItemId::from(id), detail);
        self
    }

    /// Every later call of `kind` fails with `err`.
    pub(crate) fn fail(&self, kind: &'static str, err: RemoteError) {
        self.state().failing.insert(kind, err);
    }

    pub(crate) fn heal(&self, kind: &'static str) {
        self.state().failing.remove(kind);
    }

    pub(crate) fn calls(&self) -> Calls {
        self.state().calls.clone()
    }

    pub(crate) fn unlocked(&self) -> Vec<RocketId> {
        self.state().unlocked.clone()
    }

    fn check(state: &FakeState, kind: &'static str) -> Result<(), RemoteError> {
        match state.failing.get(kind) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl RocketApi for FakeApi {
    fn profile(&self) -> Result<Profile, RemoteError> {
        let state = self.state();
        Self::check(&state, "profile")?;
        Ok(Profile {
            user_id: "u1".to_string(),
            nickname: "tester".to_string(),
            email: "tester@example.com".to_string(),
        })
    }

    fn list(&self, origin: Origin) -> Result<Vec<Rocket>, RemoteError> {
        let mut state = self.state();
        state.calls.list += 1;
        Self::check(&state, "list")?;
        Ok(state.lists.get(&origin).cloned().unwrap_or_default())
    }

    fn detail(&self, _origin: Origin, id: &ItemId) -> Result<RocketDetail, RemoteError> {
        let mut state = self.state();
        state.calls.detail += 1;
        Self::check(&state, "detail")?;
        Ok(state.details.get(id).cloned().unwrap_or_default())
    }

    fn unlock(&self, rocket: &RocketId) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.unlock += 1;
        Self::check(&state, "unlock")?;
        state.unlocked.push(rocket.clone());
        Ok(())
    }

    fn swap_displays(&self, _source: &ItemId, _target: &ItemId) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.swap += 1;
        Self::check(&state, "swap")
    }

    fn move_display(&self, _id: &ItemId, _target: usize) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.move_to_empty += 1;
        Self::check(&state, "move")
    }

    fn toggle_visibility(&self, chest: &ItemId) -> Result<bool, RemoteError> {
        let mut state = self.state();
        state.calls.toggle += 1;
        Self::check(&state, "toggle")?;
        let now_public = !state.public.remove(chest);
        if now_public {
            state.public.insert(chest.clone());
        }
        Ok(now_public)
    }

    fn download(&self, _file_id: &str) -> Result<Vec<u8>, RemoteError> {
        let mut state = self.state();
        state.calls.download += 1;
        Self::check(&state, "download")?;
        Ok(b"file".to_vec())
    }
}
