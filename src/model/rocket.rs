use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, PrimitiveDateTime};

use super::ids::{ItemId, RocketId};

/// Which list a rocket was fetched from. Decides the lock perspective and the
/// endpoint family used for details.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Origin {
    /// Rockets the user launched to themselves.
    Own,
    Received,
    Sent,
    Group,
    Display,
}

impl Origin {
    pub const CHESTS: [Origin; 4] = [Origin::Own, Origin::Received, Origin::Sent, Origin::Group];

    pub fn path(self) -> &'static str {
        match self {
            Origin::Own => "/rockets",
            Origin::Received => "/received-chests",
            Origin::Sent => "/sent-chests",
            Origin::Group => "/group-chests",
            Origin::Display => "/displays",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Origin::Own => "own",
            Origin::Received => "received",
            Origin::Sent => "sent",
            Origin::Group => "group",
            Origin::Display => "display",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "own" | "rockets" => Some(Origin::Own),
            "received" => Some(Origin::Received),
            "sent" => Some(Origin::Sent),
            "group" => Some(Origin::Group),
            "display" | "displays" => Some(Origin::Display),
            _ => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Visual skin reference, resolved to an asset by the renderer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Design(pub String);

impl Design {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short key for the skin: the last path segment without extension.
    pub fn key(&self) -> &str {
        let tail = self.0.rsplit('/').next().unwrap_or(&self.0);
        tail.split('.').next().unwrap_or(tail)
    }
}

/// A lock expiry as read from the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Schedule {
    At(OffsetDateTime),
    /// Raw value that could not be read as a timestamp.
    Invalid(String),
}

fn zoneless_formats() -> &'static [Vec<FormatItem<'static>>] {
    static FMT: OnceLock<Vec<Vec<FormatItem<'static>>>> = OnceLock::new();
    FMT.get_or_init(|| {
        [
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]",
            "[year]-[month]-[day]T[hour]:[minute]:[second]",
            "[year]-[month]-[day] [hour]:[minute]:[second]",
        ]
        .into_iter()
        .filter_map(|f| time::format_description::parse(f).ok())
        .collect()
    })
}

impl Schedule {
    /// Reads RFC 3339, or a zone-less local timestamp taken as UTC.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(at) = OffsetDateTime::parse(trimmed, &Rfc3339) {
            return Schedule::At(at);
        }
        for fmt in zoneless_formats() {
            if let Ok(at) = PrimitiveDateTime::parse(trimmed, fmt) {
                return Schedule::At(at.assume_utc());
            }
        }
        Schedule::Invalid(raw.to_string())
    }

    pub fn from_unix_millis(millis: i64) -> Self {
        match OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000) {
            Ok(at) => Schedule::At(at),
            Err(_) => Schedule::Invalid(millis.to_string()),
        }
    }

    pub fn at(&self) -> Option<OffsetDateTime> {
        match self {
            Schedule::At(at) => Some(*at),
            Schedule::Invalid(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub original_name: String,
}

/// Progress of the lazy detail fetch for one item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DetailState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    /// The last detail fetch failed; the summary is still valid.
    Failed,
}

/// Rocket normalized from any of the list payloads.
#[derive(Clone, Debug, PartialEq)]
pub struct Rocket {
    pub id: ItemId,
    pub rocket_id: RocketId,
    pub origin: Origin,
    pub name: String,
    pub design: Design,
    pub lock_expired_at: Option<Schedule>,
    pub is_locked: bool,
    pub opened_at: Option<OffsetDateTime>,
    pub content: Option<String>,
    pub attachments: Vec<Attachment>,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub is_public: bool,
    /// 0-based slot in the display grid.
    pub display_location: Option<usize>,
    pub detail: DetailState,
}

impl Rocket {
    /// Minimal unlocked rocket; handy for fixtures and tests.
    pub fn new(id: &str, origin: Origin, name: &str) -> Self {
        Rocket {
            id: ItemId::from(id),
            rocket_id: RocketId::from(id),
            origin,
            name: name.to_string(),
            design: Design::default(),
            lock_expired_at: None,
            is_locked: false,
            opened_at: None,
            content: None,
            attachments: Vec::new(),
            sender: None,
            receiver: None,
            is_public: false,
            display_location: None,
            detail: DetailState::NotLoaded,
        }
    }

    pub fn locked_until(mut self, at: OffsetDateTime) -> Self {
        self.is_locked = true;
        self.lock_expired_at = Some(Schedule::At(at));
        self
    }

    pub fn merge_detail(&mut self, detail: RocketDetail) {
        self.content = detail.content;
        self.attachments = detail.attachments;
        self.detail = DetailState::Loaded;
    }
}

/// Body of a detail fetch: the lazily-loaded part of a rocket.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RocketDetail {
    pub content: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub nickname: String,
    pub email: String,
}
