use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::types::{Envelope, ErrorBody, RefreshRequest, TokenPair};
use super::*;

impl RemoteClient {
    /// Sends an authenticated request. A 401 triggers one credential refresh
    /// and one replay; nothing else is retried.
    pub(super) fn send(
        &self,
        label: &str,
        build: impl Fn(&Client) -> RequestBuilder,
    ) -> Result<Response, RemoteError> {
        let token = self.access_token();
        tracing::debug!(label, "remote request");
        let resp = self.dispatch(label, &build, &token)?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return ensure_ok(resp, label);
        }

        tracing::debug!(label, "access token rejected, refreshing");
        self.refresh(&token)?;
        let resp = self.dispatch(label, &build, &self.access_token())?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Unauthorized);
        }
        ensure_ok(resp, label)
    }

    fn dispatch(
        &self,
        label: &str,
        build: &impl Fn(&Client) -> RequestBuilder,
        token: &str,
    ) -> Result<Response, RemoteError> {
        build(&self.client)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .map_err(|e| RemoteError::transport(label, e))
    }

    fn access_token(&self) -> String {
        self.credentials().access_token
    }

    /// `stale` is the access token the server just rejected. If another
    /// caller already replaced it, there is nothing to do.
    fn refresh(&self, stale: &str) -> Result<(), RemoteError> {
        let _guard = self.refresh_lock.lock().unwrap_or_else(|e| e.into_inner());
        let current = self.credentials();
        if current.access_token != stale {
            return Ok(());
        }
        let Some(refresh_token) = current.refresh_token else {
            return Err(RemoteError::Unauthorized);
        };

        let resp = self
            .client
            .post(self.url("/auth/refresh"))
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .map_err(|e| RemoteError::transport("refresh token", e))?;
        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), "token refresh rejected");
            return Err(RemoteError::Unauthorized);
        }

        let pair: TokenPair = read_json(resp, "refresh token")?;
        let next = pair.into_credentials(Some(refresh_token));
        *self.credentials.lock().unwrap_or_else(|e| e.into_inner()) = next.clone();
        if let Some(store) = &self.store
            && let Err(err) = store.set_credentials(&next)
        {
            tracing::warn!(error = %format!("{:#}", err), "could not persist refreshed credentials");
        }
        tracing::info!("access token refreshed");
        Ok(())
    }

    pub(super) fn url(&self, path: &str) -> String {
        format!("{}{}", self.remote.base_url.trim_end_matches('/'), path)
    }
}

pub(super) fn ensure_ok(resp: Response, label: &str) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(RemoteError::Unauthorized);
    }
    let body = resp.text().unwrap_or_default();
    let reason = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_reason);
    tracing::debug!(label, status = status.as_u16(), ?reason, "remote rejected request");
    Err(RemoteError::Rejected {
        label: label.to_string(),
        status: status.as_u16(),
        reason,
    })
}

pub(super) fn read_json<T: DeserializeOwned>(resp: Response, label: &str) -> Result<T, RemoteError> {
    resp.json::<Envelope<T>>()
        .map(Envelope::into_inner)
        .map_err(|e| RemoteError::decode(label, e))
}
