//! Error taxonomy for the rocket core.
//!
//! [`RemoteError`] describes what went wrong talking to the server,
//! [`CoreError`] adds the local precondition failures. Both carry a
//! [`user_message`](CoreError::user_message) suitable for a status line.

use thiserror::Error;

use crate::lock::LockState;
use crate::model::ItemId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never produced a response (DNS, connect, timeout...).
    #[error("{label}: transport error: {detail}")]
    Transport { label: String, detail: String },

    /// The server answered with a non-success status.
    #[error("{label}: rejected with status {status}")]
    Rejected {
        label: String,
        status: u16,
        reason: Option<String>,
    },

    /// Credentials were rejected and could not be refreshed.
    #[error("unauthorized")]
    Unauthorized,

    #[error("{label}: unexpected response body: {detail}")]
    Decode { label: String, detail: String },
}

impl RemoteError {
    pub(crate) fn transport(label: &str, err: impl std::fmt::Display) -> Self {
        RemoteError::Transport {
            label: label.to_string(),
            detail: err.to_string(),
        }
    }

    pub(crate) fn decode(label: &str, err: impl std::fmt::Display) -> Self {
        RemoteError::Decode {
            label: label.to_string(),
            detail: err.to_string(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            RemoteError::Transport { .. } => "could not reach the server, try again".to_string(),
            RemoteError::Rejected {
                reason: Some(reason),
                ..
            } if !reason.trim().is_empty() => reason.clone(),
            RemoteError::Rejected { status, .. } => {
                format!("the server rejected the request (status {status})")
            }
            RemoteError::Unauthorized => "your session expired, please log in again".to_string(),
            RemoteError::Decode { .. } => "the server sent an unexpected response".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("{0} is not in this list")]
    UnknownItem(ItemId),

    #[error("{id} cannot be unlocked while {state}")]
    NotUnlockable { id: ItemId, state: LockState },

    #[error("{id} cannot be displayed while {state}")]
    NotDisplayable { id: ItemId, state: LockState },

    #[error("{0} does not support this operation")]
    Unsupported(&'static str),

    #[error("slot {0} is out of range")]
    SlotOutOfRange(usize),

    #[error("slot {0} is empty")]
    SlotEmpty(usize),

    #[error("slot {0} is occupied")]
    SlotOccupied(usize),

    #[error("source and target are both slot {0}")]
    SameSlot(usize),

    #[error("another display move is still in flight")]
    MoveInFlight,

    #[error("local storage: {0:#}")]
    Storage(anyhow::Error),
}

impl CoreError {
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Remote(err) => err.user_message(),
            CoreError::UnknownItem(_) => "that rocket is no longer in the list".to_string(),
            CoreError::NotUnlockable {
                state: LockState::Locked,
                ..
            } => "this rocket is still locked".to_string(),
            CoreError::NotUnlockable { .. } => "this rocket is already open".to_string(),
            CoreError::NotDisplayable { .. } => {
                "only opened rockets can be put on display".to_string()
            }
            CoreError::Unsupported(what) => format!("{what} does not support this"),
            CoreError::SlotOutOfRange(_) => "there is no such display slot".to_string(),
            CoreError::SlotEmpty(_) => "there is no rocket in that slot".to_string(),
            CoreError::SlotOccupied(_) => "that slot is already taken".to_string(),
            CoreError::SameSlot(_) => "the rocket is already there".to_string(),
            CoreError::MoveInFlight => "wait for the previous move to finish".to_string(),
            CoreError::Storage(_) => "could not save local state".to_string(),
        }
    }

    /// True when the failure came from the credential flow rather than the request itself.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoreError::Remote(RemoteError::Unauthorized))
    }
}
