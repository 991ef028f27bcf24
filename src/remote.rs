use std::sync::Mutex;

use crate::error::RemoteError;
use crate::model::{Credentials, ItemId, Origin, Profile, RemoteConfig, Rocket, RocketDetail, RocketId};
use crate::store::LocalStore;

mod http_client;

mod types;
pub use self::types::normalize_rocket;
mod auth;
mod chests;
mod displays;
mod files;

/// Everything the core needs from the server.
///
/// Implemented by [`RemoteClient`]; tests swap in an in-memory fake.
pub trait RocketApi {
    fn profile(&self) -> Result<Profile, RemoteError>;
    fn list(&self, origin: Origin) -> Result<Vec<Rocket>, RemoteError>;
    fn detail(&self, origin: Origin, id: &ItemId) -> Result<RocketDetail, RemoteError>;
    fn unlock(&self, rocket: &RocketId) -> Result<(), RemoteError>;
    fn swap_displays(&self, source: &ItemId, target: &ItemId) -> Result<(), RemoteError>;
    /// `target` is the 0-based grid slot.
    fn move_display(&self, id: &ItemId, target: usize) -> Result<(), RemoteError>;
    /// Returns the new `isPublic`.
    fn toggle_visibility(&self, chest: &ItemId) -> Result<bool, RemoteError>;
    fn download(&self, file_id: &str) -> Result<Vec<u8>, RemoteError>;
}

pub struct RemoteClient {
    remote: RemoteConfig,
    credentials: Mutex<Credentials>,
    // Serializes token refreshes across worker threads.
    refresh_lock: Mutex<()>,
    client: reqwest::blocking::Client,
    store: Option<LocalStore>,
}

impl RemoteClient {
    pub fn new(remote: RemoteConfig, credentials: Credentials) -> Result<Self, RemoteError> {
        Ok(Self {
            remote,
            credentials: Mutex::new(credentials),
            refresh_lock: Mutex::new(()),
            client: build_client()?,
            store: None,
        })
    }

    /// Refreshed credentials get written back to `store`.
    pub fn with_store(mut self, store: LocalStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn remote(&self) -> &RemoteConfig {
        &self.remote
    }

    pub fn credentials(&self) -> Credentials {
        self.credentials
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

fn build_client() -> Result<reqwest::blocking::Client, RemoteError> {
    reqwest::blocking::Client::builder()
        .user_agent("rocketbox")
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| RemoteError::transport("build http client", e))
}
