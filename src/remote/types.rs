//! Wire DTOs and the mapping into the normalized [`Rocket`].
//!
//! The server spells the same field differently depending on the list
//! (`isLock`/`isLocked`, `design`/`designUrl`, ...). All of that is absorbed
//! here so nothing past this module branches on field names.

use serde::{Deserialize, Serialize};

use crate::display::grid::GRID_SLOTS;
use crate::model::{
    Attachment, Credentials, Design, DetailState, ItemId, Origin, Profile, Rocket, RocketDetail,
    RocketId, Schedule,
};

/// List and detail bodies come either bare or wrapped in `{"data": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(super) fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    pub(super) fn into_reason(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|s| !s.trim().is_empty())
    }
}

/// Ids arrive as JSON numbers from some endpoints and strings from others.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum WireId {
    Num(i64),
    Str(String),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Num(n) => n.to_string(),
            WireId::Str(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AttachmentWire {
    #[serde(alias = "fileId")]
    id: WireId,
    #[serde(alias = "fileName")]
    original_name: String,
}

impl From<AttachmentWire> for Attachment {
    fn from(w: AttachmentWire) -> Self {
        Attachment {
            id: w.id.into_string(),
            original_name: w.original_name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RocketWire {
    #[serde(alias = "chestId", alias = "displayId")]
    id: WireId,
    #[serde(default)]
    rocket_id: Option<WireId>,
    #[serde(default, alias = "rocketName")]
    name: Option<String>,
    #[serde(default, alias = "designUrl")]
    design: Option<String>,
    #[serde(default)]
    lock_expired_at: Option<serde_json::Value>,
    #[serde(default, alias = "isLock")]
    is_locked: Option<bool>,
    #[serde(default, alias = "unlockedAt")]
    opened_at: Option<String>,
    #[serde(default, alias = "senderNickname")]
    sender: Option<String>,
    #[serde(default, alias = "receiverNickname")]
    receiver: Option<String>,
    #[serde(default)]
    is_public: Option<bool>,
    #[serde(default)]
    display_location: Option<i64>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    attachments: Option<Vec<AttachmentWire>>,
}

fn read_schedule(value: serde_json::Value) -> Option<Schedule> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(Schedule::parse(&s)),
        serde_json::Value::Number(n) => Some(match n.as_i64() {
            Some(millis) => Schedule::from_unix_millis(millis),
            None => Schedule::Invalid(n.to_string()),
        }),
        other => Some(Schedule::Invalid(other.to_string())),
    }
}

/// Wire locations are 1-based; anything outside the grid is treated as unplaced.
fn read_location(raw: Option<i64>) -> Option<usize> {
    let v = raw?;
    if v < 1 || v > GRID_SLOTS as i64 {
        return None;
    }
    Some((v - 1) as usize)
}

impl RocketWire {
    pub(super) fn into_rocket(self, origin: Origin) -> Rocket {
        let id = self.id.into_string();
        let rocket_id = self
            .rocket_id
            .map(WireId::into_string)
            .unwrap_or_else(|| id.clone());
        let content = self.content;
        let attachments: Vec<Attachment> = self
            .attachments
            .unwrap_or_default()
            .into_iter()
            .map(Attachment::from)
            .collect();
        let detail = if content.is_some() || !attachments.is_empty() {
            DetailState::Loaded
        } else {
            DetailState::NotLoaded
        };
        let lock_expired_at = self.lock_expired_at.and_then(read_schedule);
        // Without the flag, a schedule means the rocket is locked until proven otherwise.
        let is_locked = self.is_locked.unwrap_or(lock_expired_at.is_some());
        Rocket {
            id: ItemId(id),
            rocket_id: RocketId(rocket_id),
            origin,
            name: self.name.unwrap_or_default(),
            design: Design(self.design.unwrap_or_default()),
            lock_expired_at,
            is_locked,
            opened_at: self.opened_at.and_then(|s| Schedule::parse(&s).at()),
            content,
            attachments,
            sender: self.sender,
            receiver: self.receiver,
            is_public: self.is_public.unwrap_or(false),
            display_location: read_location(self.display_location),
            detail,
        }
    }

    pub(super) fn into_detail(self) -> RocketDetail {
        RocketDetail {
            content: self.content,
            attachments: self
                .attachments
                .unwrap_or_default()
                .into_iter()
                .map(Attachment::from)
                .collect(),
        }
    }
}

/// Parses one list item exactly as the client does after a fetch.
pub fn normalize_rocket(value: serde_json::Value, origin: Origin) -> serde_json::Result<Rocket> {
    let wire: RocketWire = serde_json::from_value(value)?;
    Ok(wire.into_rocket(origin))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProfileWire {
    #[serde(alias = "id", alias = "memberId")]
    user_id: WireId,
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    email: String,
}

impl From<ProfileWire> for Profile {
    fn from(w: ProfileWire) -> Self {
        Profile {
            user_id: w.user_id.into_string(),
            nickname: w.nickname,
            email: w.email,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TokenPair {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenPair {
    /// Servers that do not rotate refresh tokens omit them; keep the old one.
    pub(super) fn into_credentials(self, previous_refresh: Option<String>) -> Credentials {
        Credentials {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum VisibilityWire {
    Flag(bool),
    #[serde(rename_all = "camelCase")]
    Body { is_public: bool },
}

impl VisibilityWire {
    pub(super) fn is_public(&self) -> bool {
        match self {
            VisibilityWire::Flag(v) => *v,
            VisibilityWire::Body { is_public } => *is_public,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LoginRequest<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RefreshRequest<'a> {
    pub(super) refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SwapRequest<'a> {
    pub(super) source_chest_id: &'a str,
    pub(super) target_chest_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MoveToEmptyRequest {
    pub(super) target_location: u32,
}

#[cfg(test)]
#[path = "../tests/remote/types_tests.rs"]
mod tests;
