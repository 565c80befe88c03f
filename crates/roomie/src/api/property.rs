// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::cache::EnvelopeCache;

/// Property listing as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Monthly rent in the listing's currency.
    #[serde(default)]
    pub rent: Option<f64>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Property details, cached per property id.
pub struct PropertyRepository {
    api: Arc<ApiClient>,
    cache: EnvelopeCache<Property>,
    max_age: Duration,
}

impl PropertyRepository {
    pub fn new(api: Arc<ApiClient>, cache: EnvelopeCache<Property>, max_age: Duration) -> Self {
        Self { api, cache, max_age }
    }

    pub async fn property(&self, id: &str, force_refresh: bool) -> anyhow::Result<Property> {
        let path = format!("/properties/{id}");
        self.cache
            .read_through(id, force_refresh, self.max_age, || self.api.get_json(&path))
            .await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}
