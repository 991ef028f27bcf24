//! Lock state evaluation.
//!
//! [`evaluate`] is pure: the same rocket and the same `now` always give the
//! same [`LockView`]. Nothing here errors; malformed schedules surface as a
//! locked "invalid schedule" view.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use time::OffsetDateTime;
use time::format_description::FormatItem;

use crate::model::{Attachment, ItemId, Origin, Rocket, Schedule};

pub const OPENED: &str = "opened";
pub const NO_SCHEDULE: &str = "no schedule";
pub const INVALID_SCHEDULE: &str = "invalid schedule";
pub const READY_TO_OPEN: &str = "ready to open";
pub const RECIPIENT_NOT_OPENED: &str = "recipient has not opened";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockState {
    Locked,
    /// Expired but still waiting for the explicit unlock.
    Unlockable,
    Unlocked,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LockState::Locked => "locked",
            LockState::Unlockable => "unlockable",
            LockState::Unlocked => "unlocked",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockView {
    pub state: LockState,
    pub countdown: String,
    pub hint: String,
}

impl LockView {
    fn new(state: LockState, countdown: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            state,
            countdown: countdown.into(),
            hint: hint.into(),
        }
    }
}

/// Who is looking at the rocket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Perspective {
    Recipient,
    /// The sender of a rocket addressed to someone else.
    Sender,
    Group,
}

impl From<Origin> for Perspective {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Own | Origin::Received | Origin::Display => Perspective::Recipient,
            Origin::Sent => Perspective::Sender,
            Origin::Group => Perspective::Group,
        }
    }
}

pub fn evaluate(rocket: &Rocket, now: OffsetDateTime) -> LockView {
    evaluate_parts(
        now,
        rocket.is_locked,
        rocket.lock_expired_at.as_ref(),
        Perspective::from(rocket.origin),
        rocket.opened_at,
    )
}

pub fn evaluate_parts(
    now: OffsetDateTime,
    is_locked: bool,
    expires: Option<&Schedule>,
    perspective: Perspective,
    opened_at: Option<OffsetDateTime>,
) -> LockView {
    if !is_locked {
        let hint = opened_at
            .map(|at| format!("opened at {}", fmt_instant(at)))
            .unwrap_or_default();
        return LockView::new(LockState::Unlocked, OPENED, hint);
    }

    let expires_at = match expires {
        None => return LockView::new(LockState::Locked, NO_SCHEDULE, ""),
        Some(Schedule::Invalid(_)) => return LockView::new(LockState::Locked, INVALID_SCHEDULE, ""),
        Some(Schedule::At(at)) => *at,
    };

    let remaining = expires_at - now;
    if remaining.is_positive() {
        return LockView::new(LockState::Locked, format_countdown(remaining), "");
    }

    match perspective {
        Perspective::Group => LockView::new(
            LockState::Unlocked,
            OPENED,
            format!("auto-opened, expired at {}", fmt_instant(expires_at)),
        ),
        Perspective::Sender => LockView::new(LockState::Locked, RECIPIENT_NOT_OPENED, ""),
        Perspective::Recipient => LockView::new(LockState::Unlockable, READY_TO_OPEN, ""),
    }
}

/// `DD : HH : MM : SS`, truncated towards zero.
pub fn format_countdown(remaining: time::Duration) -> String {
    let total = remaining.whole_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{days:02} : {hours:02} : {minutes:02} : {seconds:02}")
}

fn ts_ui_format() -> &'static [FormatItem<'static>] {
    static FMT: OnceLock<Vec<FormatItem<'static>>> = OnceLock::new();
    FMT.get_or_init(|| {
        time::format_description::parse(
            "[year]-[month repr:numerical padding:zero]-[day padding:zero] [hour padding:zero]:[minute padding:zero]Z",
        )
        .unwrap_or_default()
    })
}

pub fn fmt_instant(at: OffsetDateTime) -> String {
    at.to_offset(time::UtcOffset::UTC)
        .format(ts_ui_format())
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Content of a rocket that may be shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Revealed<'a> {
    pub content: Option<&'a str>,
    pub attachments: &'a [Attachment],
}

/// Only unlocked rockets expose their content, whatever the network layer
/// already fetched.
pub fn reveal<'a>(rocket: &'a Rocket, view: &LockView) -> Option<Revealed<'a>> {
    if view.state != LockState::Unlocked {
        return None;
    }
    Some(Revealed {
        content: rocket.content.as_deref(),
        attachments: &rocket.attachments,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub id: ItemId,
    pub from: LockState,
    pub to: LockState,
}

/// Cached [`LockView`]s for the rockets currently on screen, rebuilt on every tick.
#[derive(Debug, Default)]
pub struct LockBoard {
    views: HashMap<ItemId, LockView>,
}

impl LockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-evaluates every visible rocket. Items no longer visible are dropped
    /// from the cache. Returns the state changes since the previous pass.
    pub fn refresh<'a>(
        &mut self,
        visible: impl IntoIterator<Item = &'a Rocket>,
        now: OffsetDateTime,
    ) -> Vec<Transition> {
        let mut next = HashMap::new();
        let mut transitions = Vec::new();
        for rocket in visible {
            let view = evaluate(rocket, now);
            if let Some(prev) = self.views.get(&rocket.id)
                && prev.state != view.state
            {
                transitions.push(Transition {
                    id: rocket.id.clone(),
                    from: prev.state,
                    to: view.state,
                });
            }
            next.insert(rocket.id.clone(), view);
        }
        self.views = next;
        transitions
    }

    pub fn view(&self, id: &ItemId) -> Option<&LockView> {
        self.views.get(id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/lock_tests.rs"]
mod tests;
