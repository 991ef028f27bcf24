//! Login, logout and profile lookups.

use super::http_client::{ensure_ok, read_json};
use super::types::{LoginRequest, ProfileWire, TokenPair};
use super::*;

impl RemoteClient {
    /// Exchanges an email/password pair for credentials. Not authenticated.
    pub fn login(remote: &RemoteConfig, email: &str, password: &str) -> Result<Credentials, RemoteError> {
        let client = build_client()?;
        let url = format!("{}/auth/login", remote.base_url.trim_end_matches('/'));
        let resp = client
            .post(url)
            .json(&LoginRequest { email, password })
            .send()
            .map_err(|e| RemoteError::transport("login", e))?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Rejected {
                label: "login".to_string(),
                status: 401,
                reason: Some("wrong email or password".to_string()),
            });
        }
        let pair: TokenPair = read_json(ensure_ok(resp, "login")?, "parse login")?;
        Ok(pair.into_credentials(None))
    }

    pub fn logout(&self) -> Result<(), RemoteError> {
        self.send("logout", |c| c.post(self.url("/auth/logout")))?;
        Ok(())
    }

    pub fn fetch_profile(&self) -> Result<Profile, RemoteError> {
        let resp = self.send("fetch profile", |c| c.get(self.url("/members/me")))?;
        let wire: ProfileWire = read_json(resp, "parse profile")?;
        Ok(wire.into())
    }
}
