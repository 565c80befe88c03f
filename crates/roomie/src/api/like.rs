// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::ApiClient;
use crate::cache::EnvelopeCache;

/// A like or dislike cast by a user on a property or another seeker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub user_id: String,
    pub target_id: String,
    pub liked: bool,
}

/// Likes, cached per user id. Writes invalidate that user's entry.
pub struct LikeRepository {
    api: Arc<ApiClient>,
    cache: EnvelopeCache<Vec<Like>>,
    max_age: Duration,
}

impl LikeRepository {
    pub fn new(api: Arc<ApiClient>, cache: EnvelopeCache<Vec<Like>>, max_age: Duration) -> Self {
        Self { api, cache, max_age }
    }

    pub async fn likes(&self, user_id: &str, force_refresh: bool) -> anyhow::Result<Vec<Like>> {
        let path = format!("/likes/{user_id}");
        self.cache
            .read_through(user_id, force_refresh, self.max_age, || self.api.get_json(&path))
            .await
    }

    pub async fn like(&self, user_id: &str, target_id: &str) -> anyhow::Result<()> {
        self.cast(user_id, target_id, true).await
    }

    pub async fn dislike(&self, user_id: &str, target_id: &str) -> anyhow::Result<()> {
        self.cast(user_id, target_id, false).await
    }

    async fn cast(&self, user_id: &str, target_id: &str, liked: bool) -> anyhow::Result<()> {
        let like =
            Like { user_id: user_id.to_owned(), target_id: target_id.to_owned(), liked };
        self.api.post_empty("/likes", &like).await?;
        self.cache.remove(user_id).await;
        debug!(user = %user_id, target = %target_id, liked, "like recorded");
        Ok(())
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}

#[cfg(test)]
#[path = "like_tests.rs"]
mod tests;
