// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access token refresh: one POST, all-or-nothing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::session::{non_blank, Rotation, SessionStore};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    access_token: &'a str,
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Exchanges the stored token pair for a new one and writes it back.
pub struct TokenRefresher {
    http: reqwest::Client,
    refresh_url: String,
    store: Arc<SessionStore>,
}

impl TokenRefresher {
    pub fn new(http: reqwest::Client, base_url: &str, store: Arc<SessionStore>) -> Self {
        let refresh_url = format!("{}/auth/refresh", base_url.trim_end_matches('/'));
        Self { http, refresh_url, store }
    }

    /// Refresh and return the new access token.
    ///
    /// The store is written only after a complete, valid 200 response, so a
    /// failure or a dropped future leaves it untouched. The stored user id and
    /// user type are kept as they are.
    pub async fn refresh(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<String, AuthError> {
        let (Some(access_token), Some(refresh_token)) =
            (non_blank(access_token), non_blank(refresh_token))
        else {
            debug!("refresh skipped: no token pair");
            return Err(AuthError::MissingCredentials);
        };

        let resp = self
            .http
            .post(&self.refresh_url)
            .json(&RefreshRequest { access_token, refresh_token })
            .send()
            .await
            .map_err(|e| {
                warn!(err = %e, "refresh request failed");
                AuthError::NetworkFailure
            })?;

        let status = resp.status();
        // The body may echo credentials; only the status is logged.
        if status != reqwest::StatusCode::OK {
            warn!(%status, "refresh rejected");
            return Err(AuthError::Rejected);
        }

        let bytes = resp.bytes().await.map_err(|e| {
            warn!(err = %e, "refresh response body failed");
            AuthError::NetworkFailure
        })?;
        let body: RefreshResponse = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(err = %e, "refresh response is not valid JSON");
            AuthError::MalformedResponse
        })?;
        let (Some(new_access), Some(new_refresh)) = (
            body.access_token.filter(|s| !s.trim().is_empty()),
            body.refresh_token.filter(|s| !s.trim().is_empty()),
        ) else {
            warn!("refresh response missing accessToken or refreshToken");
            return Err(AuthError::MalformedResponse);
        };

        let outcome = self
            .store
            .rotate_tokens(refresh_token, new_access.clone(), new_refresh)
            .await
            .map_err(|e| {
                warn!(err = %e, "failed to persist refreshed session");
                AuthError::Storage
            })?;

        match outcome {
            Rotation::Updated => {
                info!("access token refreshed");
                Ok(new_access)
            }
            Rotation::Superseded(session) => {
                debug!("refresh superseded by a concurrent rotation");
                non_blank(session.access_token.as_deref())
                    .map(str::to_owned)
                    .ok_or(AuthError::MissingCredentials)
            }
            Rotation::LoggedOut => {
                debug!("session cleared during refresh, discarding new tokens");
                Err(AuthError::MissingCredentials)
            }
        }
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
