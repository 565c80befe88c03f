// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::property::Property;
use crate::api::ApiClient;
use crate::cache::EnvelopeCache;

/// A property suggested to a roommate seeker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMatch {
    pub property: Property,
    /// Backend-computed compatibility, 0 to 100.
    #[serde(default)]
    pub score: f64,
}

/// Another seeker suggested as a roommate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoommateMatch {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub score: f64,
}

/// Match lists, cached per seeker id.
pub struct MatchRepository {
    api: Arc<ApiClient>,
    properties: EnvelopeCache<Vec<PropertyMatch>>,
    roommates: EnvelopeCache<Vec<RoommateMatch>>,
    max_age: Duration,
}

impl MatchRepository {
    pub fn new(
        api: Arc<ApiClient>,
        properties: EnvelopeCache<Vec<PropertyMatch>>,
        roommates: EnvelopeCache<Vec<RoommateMatch>>,
        max_age: Duration,
    ) -> Self {
        Self { api, properties, roommates, max_age }
    }

    pub async fn property_matches(
        &self,
        seeker_id: &str,
        force_refresh: bool,
    ) -> anyhow::Result<Vec<PropertyMatch>> {
        let path = format!("/matches/seekers/{seeker_id}/properties");
        self.properties
            .read_through(seeker_id, force_refresh, self.max_age, || self.api.get_json(&path))
            .await
    }

    pub async fn roommate_matches(
        &self,
        seeker_id: &str,
        force_refresh: bool,
    ) -> anyhow::Result<Vec<RoommateMatch>> {
        let path = format!("/matches/seekers/{seeker_id}/roommates");
        self.roommates
            .read_through(seeker_id, force_refresh, self.max_age, || self.api.get_json(&path))
            .await
    }

    pub async fn clear_cache(&self) {
        self.properties.clear().await;
        self.roommates.clear().await;
    }
}

#[cfg(test)]
#[path = "matches_tests.rs"]
mod tests;
