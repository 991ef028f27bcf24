//! Members, rockets, tokens and the rules the real server enforces.
//!
//! Every chest id equals the id of the rocket it holds, and so does the
//! display id, which keeps fixture files readable.

use std::collections::BTreeMap;

use time::format_description::well_known::Rfc3339;

use super::*;

const DISPLAY_SLOTS: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ListKind {
    Own,
    Received,
    Sent,
    Group,
    Display,
}

#[derive(Debug)]
pub(super) enum Refusal {
    NotFound,
    Forbidden(&'static str),
    Conflict(&'static str),
    BadRequest(&'static str),
}

#[derive(Clone, Debug)]
struct Member {
    id: u64,
    nickname: String,
    email: String,
    password: String,
}

#[derive(Clone, Debug)]
struct RocketRec {
    id: u64,
    name: String,
    design: String,
    sender: u64,
    receiver: Option<u64>,
    group: Vec<u64>,
    lock_expired_at: OffsetDateTime,
    is_locked: bool,
    unlocked_at: Option<OffsetDateTime>,
    content: String,
    files: Vec<u64>,
    is_public: bool,
    display_location: Option<u32>,
}

impl RocketRec {
    /// Group rockets open by themselves once expired; others need an unlock.
    fn is_open(&self, now: OffsetDateTime) -> bool {
        !self.is_locked || (!self.group.is_empty() && now >= self.lock_expired_at)
    }

    fn listed_in(&self, kind: ListKind, member: u64, now: OffsetDateTime) -> bool {
        let received = self.receiver == Some(member) && self.sender != member;
        match kind {
            ListKind::Own => self.sender == member && self.receiver == Some(member),
            ListKind::Received => received,
            ListKind::Sent => self.sender == member && self.receiver.is_some_and(|r| r != member),
            ListKind::Group => {
                !self.group.is_empty() && (self.sender == member || self.group.contains(&member))
            }
            ListKind::Display => {
                received
                    && self.is_public
                    && self.display_location.is_some()
                    && self.is_open(now)
            }
        }
    }
}

#[derive(Clone, Debug)]
struct FileRec {
    name: String,
    bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
struct Grant {
    member: u64,
    expires_at: OffsetDateTime,
}

pub(super) struct TokenPair {
    pub(super) access_token: String,
    pub(super) refresh_token: String,
}

pub(super) struct World {
    members: BTreeMap<u64, Member>,
    rockets: BTreeMap<u64, RocketRec>,
    files: HashMap<u64, FileRec>,
    // Keyed by token hash.
    access: HashMap<String, Grant>,
    refresh: HashMap<String, u64>,
}

pub(super) fn hash_token(secret: &str) -> String {
    blake3::hash(secret.as_bytes()).to_hex().to_string()
}

fn new_secret() -> Result<String> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes).map_err(|e| anyhow::anyhow!("getrandom: {:?}", e))?;
    Ok(bytes.iter().map(|b| format!("{:02x}", b)).collect())
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| "<time>".to_string())
}

impl World {
    pub(super) fn from_fixtures(fixtures: Fixtures, now: OffsetDateTime) -> Result<Self> {
        let members: BTreeMap<u64, Member> = fixtures
            .members
            .into_iter()
            .map(|m| {
                (
                    m.id,
                    Member {
                        id: m.id,
                        nickname: m.nickname,
                        email: m.email,
                        password: m.password,
                    },
                )
            })
            .collect();

        let mut rockets = BTreeMap::new();
        for r in fixtures.rockets {
            for who in std::iter::once(r.sender).chain(r.receiver).chain(r.group.iter().copied()) {
                if !members.contains_key(&who) {
                    anyhow::bail!("rocket {} refers to unknown member {}", r.id, who);
                }
            }
            if r.receiver.is_none() && r.group.is_empty() {
                anyhow::bail!("rocket {} has neither a receiver nor a group", r.id);
            }
            if let Some(loc) = r.display_location
                && !(1..=DISPLAY_SLOTS).contains(&loc)
            {
                anyhow::bail!("rocket {} has display location {} outside 1..=10", r.id, loc);
            }
            let lock_expired_at = now + time::Duration::seconds(r.lock_in_secs);
            let rec = RocketRec {
                id: r.id,
                name: r.name,
                design: r.design,
                sender: r.sender,
                receiver: r.receiver,
                group: r.group,
                lock_expired_at,
                is_locked: !r.unlocked,
                unlocked_at: r.unlocked.then_some(lock_expired_at),
                content: r.content,
                files: r.files,
                is_public: r.public,
                display_location: r.display_location,
            };
            if rockets.insert(rec.id, rec).is_some() {
                anyhow::bail!("duplicate rocket id {}", r.id);
            }
        }

        let files = fixtures
            .files
            .into_iter()
            .map(|f| {
                (
                    f.id,
                    FileRec {
                        name: f.name,
                        bytes: f.content.into_bytes(),
                    },
                )
            })
            .collect();

        Ok(Self {
            members,
            rockets,
            files,
            access: HashMap::new(),
            refresh: HashMap::new(),
        })
    }

    pub(super) fn member_count(&self) -> usize {
        self.members.len()
    }

    pub(super) fn rocket_count(&self) -> usize {
        self.rockets.len()
    }

    // ---- tokens -------------------------------------------------------

    fn issue(&mut self, member: u64, ttl: time::Duration, now: OffsetDateTime) -> Result<TokenPair> {
        let access_token = new_secret()?;
        let refresh_token = new_secret()?;
        self.access.insert(
            hash_token(&access_token),
            Grant {
                member,
                expires_at: now + ttl,
            },
        );
        self.refresh.insert(hash_token(&refresh_token), member);
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub(super) fn login(
        &mut self,
        email: &str,
        password: &str,
        ttl: time::Duration,
        now: OffsetDateTime,
    ) -> Result<Option<TokenPair>> {
        let Some(member) = self
            .members
            .values()
            .find(|m| m.email.eq_ignore_ascii_case(email) && m.password == password)
            .map(|m| m.id)
        else {
            return Ok(None);
        };
        self.issue(member, ttl, now).map(Some)
    }

    /// Rotates `refresh_token`. The old one stops working.
    pub(super) fn refresh(
        &mut self,
        refresh_token: &str,
        ttl: time::Duration,
        now: OffsetDateTime,
    ) -> Result<Option<TokenPair>> {
        let Some(member) = self.refresh.remove(&hash_token(refresh_token)) else {
            return Ok(None);
        };
        self.issue(member, ttl, now).map(Some)
    }

    pub(super) fn authenticate(&self, access_token: &str, now: OffsetDateTime) -> Option<u64> {
        let grant = self.access.get(&hash_token(access_token))?;
        (now <= grant.expires_at).then_some(grant.member)
    }

    /// Drops every token the member holds.
    pub(super) fn logout(&mut self, member: u64) {
        self.access.retain(|_, g| g.member != member);
        self.refresh.retain(|_, m| *m != member);
    }

    // ---- reads --------------------------------------------------------

    pub(super) fn profile(&self, member: u64) -> Option<Value> {
        let m = self.members.get(&member)?;
        Some(json!({
            "userId": m.id,
            "nickname": m.nickname,
            "email": m.email,
        }))
    }

    fn nickname(&self, member: u64) -> &str {
        self.members
            .get(&member)
            .map(|m| m.nickname.as_str())
            .unwrap_or("unknown")
    }

    /// Each list spells its fields the way the production server does.
    fn summary(&self, r: &RocketRec, kind: ListKind) -> Value {
        let expires = rfc3339(r.lock_expired_at);
        let opened = r.unlocked_at.map(rfc3339);
        match kind {
            ListKind::Own => json!({
                "id": r.id,
                "rocketName": r.name,
                "designUrl": r.design,
                "lockExpiredAt": expires,
                "isLocked": r.is_locked,
                "unlockedAt": opened,
            }),
            ListKind::Received => json!({
                "chestId": r.id,
                "rocketId": r.id,
                "rocketName": r.name,
                "designUrl": r.design,
                "lockExpiredAt": expires,
                "isLocked": r.is_locked,
                "unlockedAt": opened,
                "senderNickname": self.nickname(r.sender),
                "isPublic": r.is_public,
                "displayLocation": r.display_location,
            }),
            ListKind::Sent => json!({
                "chestId": r.id,
                "rocketId": r.id,
                "rocketName": r.name,
                "designUrl": r.design,
                "lockExpiredAt": expires,
                "isLocked": r.is_locked,
                "receiverNickname": r.receiver.map(|m| self.nickname(m)),
            }),
            ListKind::Group => json!({
                "chestId": r.id,
                "rocketId": r.id,
                "name": r.name,
                "design": r.design,
                "lockExpiredAt": (r.lock_expired_at.unix_timestamp_nanos() / 1_000_000) as i64,
                "isLock": r.is_locked,
                "senderNickname": self.nickname(r.sender),
            }),
            ListKind::Display => json!({
                "displayId": r.id,
                "rocketId": r.id,
                "rocketName": r.name,
                "designUrl": r.design,
                "isLocked": false,
                "senderNickname": self.nickname(r.sender),
                "displayLocation": r.display_location,
            }),
        }
    }

    pub(super) fn list(&self, kind: ListKind, member: u64, now: OffsetDateTime) -> Vec<Value> {
        let mut rows: Vec<&RocketRec> = self
            .rockets
            .values()
            .filter(|r| r.listed_in(kind, member, now))
            .collect();
        if kind == ListKind::Display {
            rows.sort_by_key(|r| r.display_location);
        }
        rows.into_iter().map(|r| self.summary(r, kind)).collect()
    }

    fn listed(&self, kind: ListKind, member: u64, id: u64, now: OffsetDateTime) -> Result<&RocketRec, Refusal> {
        self.rockets
            .get(&id)
            .filter(|r| r.listed_in(kind, member, now))
            .ok_or(Refusal::NotFound)
    }

    /// Content and attachments. Senders always see what they wrote.
    pub(super) fn detail(
        &self,
        kind: ListKind,
        member: u64,
        id: u64,
        now: OffsetDateTime,
    ) -> Result<Value, Refusal> {
        let r = self.listed(kind, member, id, now)?;
        if r.sender != member && !r.is_open(now) {
            return Err(Refusal::Forbidden("rocket is still locked"));
        }
        let attachments: Vec<Value> = r
            .files
            .iter()
            .filter_map(|f| {
                self.files
                    .get(f)
                    .map(|file| json!({"fileId": f, "fileName": file.name}))
            })
            .collect();
        let mut body = self.summary(r, kind);
        if let Some(obj) = body.as_object_mut() {
            obj.insert("content".to_string(), json!(r.content));
            obj.insert("attachments".to_string(), json!(attachments));
        }
        Ok(body)
    }

    pub(super) fn file(&self, member: u64, id: u64, now: OffsetDateTime) -> Result<(String, Vec<u8>), Refusal> {
        let file = self.files.get(&id).ok_or(Refusal::NotFound)?;
        let visible = self.rockets.values().any(|r| {
            r.files.contains(&id)
                && (r.sender == member
                    || ((r.receiver == Some(member) || r.group.contains(&member)) && r.is_open(now)))
        });
        if !visible {
            return Err(Refusal::Forbidden("file is not available"));
        }
        Ok((file.name.clone(), file.bytes.clone()))
    }

    // ---- writes -------------------------------------------------------

    /// Opens a rocket addressed to `member`. Repeating it is harmless.
    pub(super) fn unlock(&mut self, member: u64, id: u64, now: OffsetDateTime) -> Result<(), Refusal> {
        let r = self
            .rockets
            .get_mut(&id)
            .filter(|r| r.receiver == Some(member))
            .ok_or(Refusal::NotFound)?;
        if !r.is_locked {
            return Ok(());
        }
        if now < r.lock_expired_at {
            return Err(Refusal::Conflict("rocket is still locked"));
        }
        r.is_locked = false;
        r.unlocked_at = Some(now);
        Ok(())
    }

    fn taken_locations(&self, member: u64, now: OffsetDateTime) -> Vec<u32> {
        self.rockets
            .values()
            .filter(|r| r.listed_in(ListKind::Display, member, now))
            .filter_map(|r| r.display_location)
            .collect()
    }

    /// Flips a received chest on or off the display. Returns the new `isPublic`.
    pub(super) fn toggle_visibility(&mut self, member: u64, id: u64, now: OffsetDateTime) -> Result<bool, Refusal> {
        let r = self.listed(ListKind::Received, member, id, now)?;
        if !r.is_open(now) {
            return Err(Refusal::Conflict("only opened rockets can be displayed"));
        }
        let next = if r.is_public {
            None
        } else {
            let taken = self.taken_locations(member, now);
            let free = (1..=DISPLAY_SLOTS)
                .find(|l| !taken.contains(l))
                .ok_or(Refusal::Conflict("the display is full"))?;
            Some(free)
        };
        let r = self.rockets.get_mut(&id).ok_or(Refusal::NotFound)?;
        r.is_public = next.is_some();
        r.display_location = next;
        Ok(r.is_public)
    }

    pub(super) fn swap(&mut self, member: u64, source: u64, target: u64, now: OffsetDateTime) -> Result<(), Refusal> {
        if source == target {
            return Err(Refusal::BadRequest("source and target are the same display"));
        }
        let a = self.listed(ListKind::Display, member, source, now)?.display_location;
        let b = self.listed(ListKind::Display, member, target, now)?.display_location;
        if let Some(r) = self.rockets.get_mut(&source) {
            r.display_location = b;
        }
        if let Some(r) = self.rockets.get_mut(&target) {
            r.display_location = a;
        }
        Ok(())
    }

    pub(super) fn move_to_empty(
        &mut self,
        member: u64,
        id: u64,
        target_location: u32,
        now: OffsetDateTime,
    ) -> Result<(), Refusal> {
        if !(1..=DISPLAY_SLOTS).contains(&target_location) {
            return Err(Refusal::BadRequest("targetLocation must be between 1 and 10"));
        }
        self.listed(ListKind::Display, member, id, now)?;
        if self.taken_locations(member, now).contains(&target_location) {
            return Err(Refusal::Conflict("that display slot is taken"));
        }
        if let Some(r) = self.rockets.get_mut(&id) {
            r.display_location = Some(target_location);
        }
        Ok(())
    }
}
