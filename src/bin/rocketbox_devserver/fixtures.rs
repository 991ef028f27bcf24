//! Seed data for the in-memory world.
//!
//! Lock times are relative to server start so a fixture file stays useful
//! no matter when it is loaded.

use serde::Deserialize;

use super::*;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Fixtures {
    pub(super) members: Vec<MemberFixture>,
    pub(super) rockets: Vec<RocketFixture>,
    #[serde(default)]
    pub(super) files: Vec<FileFixture>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MemberFixture {
    pub(super) id: u64,
    pub(super) nickname: String,
    pub(super) email: String,
    pub(super) password: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RocketFixture {
    pub(super) id: u64,
    pub(super) name: String,
    #[serde(default)]
    pub(super) design: String,
    pub(super) sender: u64,
    /// Single recipient; absent for group rockets.
    #[serde(default)]
    pub(super) receiver: Option<u64>,
    /// Group members other than the sender.
    #[serde(default)]
    pub(super) group: Vec<u64>,
    /// Seconds from server start until the lock expires; negative is already expired.
    pub(super) lock_in_secs: i64,
    #[serde(default)]
    pub(super) unlocked: bool,
    #[serde(default)]
    pub(super) content: String,
    #[serde(default)]
    pub(super) files: Vec<u64>,
    #[serde(default)]
    pub(super) public: bool,
    /// 1-based display slot.
    #[serde(default)]
    pub(super) display_location: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FileFixture {
    pub(super) id: u64,
    pub(super) name: String,
    pub(super) content: String,
}

pub(super) fn load_fixtures(path: &std::path::Path) -> Result<Fixtures> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read fixtures {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse fixtures {}", path.display()))
}

fn rocket(id: u64, name: &str, sender: u64, receiver: Option<u64>, lock_in_secs: i64) -> RocketFixture {
    RocketFixture {
        id,
        name: name.to_string(),
        design: format!("/designs/{}.png", ["moon", "comet", "nebula"][(id % 3) as usize]),
        sender,
        receiver,
        group: Vec::new(),
        lock_in_secs,
        unlocked: false,
        content: format!("message inside {}", name),
        files: Vec::new(),
        public: false,
        display_location: None,
    }
}

/// One member (`email`/`password`) with a friend and a rocket in every state.
pub(super) fn sample_fixtures(email: &str, password: &str) -> Fixtures {
    const DEV: u64 = 1;
    const VEGA: u64 = 2;
    const HOUR: i64 = 3600;

    let mut rockets = vec![
        rocket(1, "note to self", DEV, Some(DEV), HOUR),
        rocket(2, "new year wishes", DEV, Some(DEV), -HOUR),
        rocket(3, "birthday surprise", VEGA, Some(DEV), 24 * HOUR),
        rocket(4, "summer memories", VEGA, Some(DEV), -60),
        rocket(5, "first launch", VEGA, Some(DEV), -24 * HOUR),
        rocket(6, "road trip", VEGA, Some(DEV), -2 * 24 * HOUR),
        rocket(7, "old photos", VEGA, Some(DEV), -3 * 24 * HOUR),
        rocket(8, "for vega", DEV, Some(VEGA), 7 * 24 * HOUR),
        rocket(9, "team retro", VEGA, None, -HOUR),
        rocket(10, "launch party", VEGA, None, 2 * HOUR),
    ];
    for r in rockets.iter_mut() {
        match r.id {
            5 => {
                r.unlocked = true;
                r.public = true;
                r.display_location = Some(1);
                r.files = vec![100];
            }
            6 => {
                r.unlocked = true;
                r.public = true;
                r.display_location = Some(3);
            }
            7 => r.unlocked = true,
            9 | 10 => r.group = vec![DEV],
            _ => {}
        }
    }

    Fixtures {
        members: vec![
            MemberFixture {
                id: DEV,
                nickname: "dev".to_string(),
                email: email.to_string(),
                password: password.to_string(),
            },
            MemberFixture {
                id: VEGA,
                nickname: "vega".to_string(),
                email: "vega@rocketbox.local".to_string(),
                password: "vega".to_string(),
            },
        ],
        rockets,
        files: vec![FileFixture {
            id: 100,
            name: "hello.txt".to_string(),
            content: "hello from the past\n".to_string(),
        }],
    }
}
