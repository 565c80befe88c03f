// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sign-in and sign-out.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::AuthError;
use crate::session::{non_blank, Session, SessionStore, UserType};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    user_type: Option<UserType>,
}

/// Establishes and tears down the session.
pub struct AuthApi {
    api: Arc<ApiClient>,
    store: Arc<SessionStore>,
}

impl AuthApi {
    pub fn new(api: Arc<ApiClient>, store: Arc<SessionStore>) -> Self {
        Self { api, store }
    }

    /// Exchange credentials for a session and persist it.
    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<Session> {
        let resp = self
            .api
            .http()
            .post(self.api.endpoint("/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| {
                warn!(err = %e, "login request failed");
                AuthError::from(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "login rejected");
            anyhow::bail!("login failed ({status})");
        }

        let body: LoginResponse = resp.json().await.map_err(|e| {
            warn!(err = %e, "login response is not valid JSON");
            AuthError::MalformedResponse
        })?;
        let (Some(access), Some(refresh), Some(user_id), Some(user_type)) = (
            non_blank(body.access_token.as_deref()),
            non_blank(body.refresh_token.as_deref()),
            non_blank(body.user_id.as_deref()),
            body.user_type,
        ) else {
            warn!("login response missing session fields");
            return Err(AuthError::MalformedResponse.into());
        };

        self.store
            .save_session(
                access.to_owned(),
                refresh.to_owned(),
                Some(user_id.to_owned()),
                Some(user_type),
            )
            .await?;
        info!(user = %user_id, %user_type, "logged in");
        Ok(self.store.snapshot())
    }

    /// Forget the session. Cached entities are cleared by [`crate::Client::logout`].
    pub async fn logout(&self) -> anyhow::Result<()> {
        self.store.clear().await
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
