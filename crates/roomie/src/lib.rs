// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Roomie: session pipeline and read-through caches for the roommate
//! matching backend.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gate;
pub mod persist;
pub mod refresh;
pub mod session;
pub mod token;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::{Arc, Once};
use std::time::Duration;

use crate::api::auth::AuthApi;
use crate::api::like::LikeRepository;
use crate::api::matches::MatchRepository;
use crate::api::property::PropertyRepository;
use crate::api::ApiClient;
use crate::cache::EnvelopeCache;
use crate::config::ClientConfig;
use crate::gate::AuthGate;
use crate::refresh::TokenRefresher;
use crate::session::SessionStore;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times; only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Build the HTTP client shared by every component.
pub fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    ensure_crypto();
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Everything one session needs, wired together once at startup.
///
/// Constructed explicitly and passed around; there is no global instance.
pub struct Client {
    pub config: ClientConfig,
    pub store: Arc<SessionStore>,
    pub gate: Arc<AuthGate>,
    pub api: Arc<ApiClient>,
    pub auth: AuthApi,
    pub properties: PropertyRepository,
    pub matches: MatchRepository,
    pub likes: LikeRepository,
}

impl Client {
    /// Client persisting the session and caches under the state directory.
    pub fn open(config: ClientConfig) -> anyhow::Result<Self> {
        let store = SessionStore::open(config.session_path())?;
        let caches = Caches {
            properties: EnvelopeCache::open("properties", config.cache_path("properties")),
            property_matches: EnvelopeCache::open(
                "property_matches",
                config.cache_path("property_matches"),
            ),
            roommate_matches: EnvelopeCache::open(
                "roommate_matches",
                config.cache_path("roommate_matches"),
            ),
            likes: EnvelopeCache::open("likes", config.cache_path("likes")),
        };
        Self::assemble(config, store, caches)
    }

    /// Client keeping everything in memory.
    pub fn in_memory(config: ClientConfig) -> anyhow::Result<Self> {
        let caches = Caches {
            properties: EnvelopeCache::in_memory("properties"),
            property_matches: EnvelopeCache::in_memory("property_matches"),
            roommate_matches: EnvelopeCache::in_memory("roommate_matches"),
            likes: EnvelopeCache::in_memory("likes"),
        };
        Self::assemble(config, SessionStore::in_memory(), caches)
    }

    fn assemble(
        config: ClientConfig,
        store: Arc<SessionStore>,
        caches: Caches,
    ) -> anyhow::Result<Self> {
        let http = http_client(config.request_timeout())?;
        let base = config.api_base().to_owned();
        let refresher = Arc::new(TokenRefresher::new(http.clone(), &base, Arc::clone(&store)));
        let gate = Arc::new(AuthGate::new(
            Arc::clone(&store),
            refresher,
            config.refresh_threshold_secs,
        ));
        let api = Arc::new(ApiClient::new(&base, http, Arc::clone(&gate)));

        let ms = Duration::from_millis;
        Ok(Self {
            auth: AuthApi::new(Arc::clone(&api), Arc::clone(&store)),
            properties: PropertyRepository::new(
                Arc::clone(&api),
                caches.properties,
                ms(config.property_cache_max_age_ms),
            ),
            matches: MatchRepository::new(
                Arc::clone(&api),
                caches.property_matches,
                caches.roommate_matches,
                ms(config.match_cache_max_age_ms),
            ),
            likes: LikeRepository::new(
                Arc::clone(&api),
                caches.likes,
                ms(config.like_cache_max_age_ms),
            ),
            config,
            store,
            gate,
            api,
        })
    }

    /// The signed-in user's id, or `SessionMissing`.
    pub fn user_id(&self) -> anyhow::Result<String> {
        self.store.user_id().ok_or_else(|| error::AuthError::SessionMissing.into())
    }

    /// End the session: drop the tokens and every cached entity.
    pub async fn logout(&self) -> anyhow::Result<()> {
        self.auth.logout().await?;
        self.properties.clear_cache().await;
        self.matches.clear_cache().await;
        self.likes.clear_cache().await;
        Ok(())
    }
}

struct Caches {
    properties: EnvelopeCache<api::property::Property>,
    property_matches: EnvelopeCache<Vec<api::matches::PropertyMatch>>,
    roommate_matches: EnvelopeCache<Vec<api::matches::RoommateMatch>>,
    likes: EnvelopeCache<Vec<api::like::Like>>,
}
