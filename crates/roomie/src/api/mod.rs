// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the matching backend, plus the repositories built on it.
//!
//! Every protected call asks the [`AuthGate`] for a token and sends it as
//! `Authorization: Bearer`. Login is the only unauthenticated call.

pub mod auth;
pub mod like;
pub mod matches;
pub mod property;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::gate::AuthGate;

/// Authenticated JSON client for one backend origin.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    gate: Arc<AuthGate>,
}

impl ApiClient {
    pub fn new(base_url: &str, http: reqwest::Client, gate: Arc<AuthGate>) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_owned(), http, gate }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        self.url(path)
    }

    /// Attach a currently valid bearer token.
    async fn apply_auth(
        &self,
        req: reqwest::RequestBuilder,
    ) -> anyhow::Result<reqwest::RequestBuilder> {
        let token = self.gate.valid_token().await?;
        Ok(req.bearer_auth(token))
    }

    /// GET a protected resource.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let req = self.apply_auth(self.http.get(self.url(path))).await?;
        let value = req.send().await?.error_for_status()?.json().await?;
        Ok(value)
    }

    /// POST JSON to a protected endpoint and decode the response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> anyhow::Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.apply_auth(self.http.post(self.url(path)).json(body)).await?;
        let value = req.send().await?.error_for_status()?.json().await?;
        Ok(value)
    }

    /// POST JSON to a protected endpoint, ignoring any response body.
    pub async fn post_empty<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<()> {
        let req = self.apply_auth(self.http.post(self.url(path)).json(body)).await?;
        req.send().await?.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
