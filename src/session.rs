//! Explicit session context.
//!
//! Components that care about authentication get a `&Session` (or `&mut`
//! when they may sign the user out); there is no global auth state.

use crate::error::CoreError;
use crate::model::Profile;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    profile: Option<Profile>,
}

impl Session {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(profile: Profile) -> Self {
        Self {
            profile: Some(profile),
        }
    }

    pub fn sign_in(&mut self, profile: Profile) {
        tracing::debug!(user_id = %profile.user_id, "session signed in");
        self.profile = Some(profile);
    }

    pub fn sign_out(&mut self) {
        if self.profile.take().is_some() {
            tracing::info!("session signed out");
        }
    }

    /// Signs out when `err` says the credentials are gone for good.
    pub fn observe(&mut self, err: &CoreError) {
        if err.is_unauthorized() {
            self.sign_out();
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.user_id.as_str())
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }
}
