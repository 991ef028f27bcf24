use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an item inside one list (chest id, display id).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId(value.to_string())
    }
}

/// Identifier of the underlying rocket, shared by every list it shows up in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RocketId(pub String);

impl RocketId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RocketId {
    fn from(value: &str) -> Self {
        RocketId(value.to_string())
    }
}
