use serde::{Deserialize, Serialize};

use super::rocket::Profile;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            remote: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Contents of `session.json`: the tokens plus the last profile fetched with them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub version: u32,

    #[serde(default)]
    pub credentials: Option<Credentials>,

    #[serde(default)]
    pub profile: Option<Profile>,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            version: 1,
            credentials: None,
            profile: None,
        }
    }
}
