// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-through entity caches.
//!
//! Every repository decides local-vs-remote with [`should_use_cache`] and
//! falls back to the stale copy when the network fetch fails.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::persist;

/// A cached payload and when it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub payload: T,
    /// Epoch milliseconds.
    pub fetched_at_ms: u64,
}

/// Whether a cached envelope may be served instead of hitting the network.
///
/// False when `force_refresh` is set, when nothing is cached, or once the
/// envelope is `max_age_ms` old or older.
pub fn should_use_cache<T>(
    envelope: Option<&Envelope<T>>,
    force_refresh: bool,
    max_age_ms: u64,
    now_ms: u64,
) -> bool {
    if force_refresh {
        return false;
    }
    match envelope {
        // Clock skew can stamp an envelope in the future; count that as fresh.
        Some(envelope) => now_ms.saturating_sub(envelope.fetched_at_ms) < max_age_ms,
        None => false,
    }
}

pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

/// Envelopes keyed by entity id, optionally mirrored to a JSON file.
pub struct EnvelopeCache<T> {
    name: &'static str,
    entries: RwLock<HashMap<String, Envelope<T>>>,
    path: Option<PathBuf>,
}

impl<T> EnvelopeCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    pub fn in_memory(name: &'static str) -> Self {
        Self { name, entries: RwLock::new(HashMap::new()), path: None }
    }

    /// Open a file-backed cache. A corrupt file is discarded, not fatal.
    pub fn open(name: &'static str, path: PathBuf) -> Self {
        let entries = match persist::load(&path) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                warn!(cache = name, path = %path.display(), err = %e, "discarding unreadable cache");
                HashMap::new()
            }
        };
        Self { name, entries: RwLock::new(entries), path: Some(path) }
    }

    pub async fn get(&self, key: &str) -> Option<Envelope<T>> {
        self.entries.read().await.get(key).cloned()
    }

    /// Replace the whole envelope for `key`.
    pub async fn put(&self, key: &str, payload: T, fetched_at_ms: u64) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_owned(), Envelope { payload, fetched_at_ms });
        self.persist(&entries);
    }

    pub async fn remove(&self, key: &str) {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        self.persist(&entries);
    }

    /// Cache failures never fail the read; the in-memory copy stays
    /// authoritative for this process.
    fn persist(&self, entries: &HashMap<String, Envelope<T>>) {
        if let Some(ref path) = self.path {
            if let Err(e) = persist::save(path, entries) {
                warn!(cache = self.name, err = %e, "failed to persist cache");
            }
        }
    }

    /// Serve `key` from cache when fresh, else fetch and store.
    ///
    /// A failed fetch falls back to the cached payload regardless of age; the
    /// error only propagates when nothing is cached, or when the session is
    /// gone and the user has to sign in again.
    pub async fn read_through<F, Fut>(
        &self,
        key: &str,
        force_refresh: bool,
        max_age: Duration,
        fetch: F,
    ) -> anyhow::Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let cached = self.get(key).await;
        let max_age_ms = max_age.as_millis() as u64;
        if should_use_cache(cached.as_ref(), force_refresh, max_age_ms, epoch_ms()) {
            if let Some(ref envelope) = cached {
                debug!(cache = self.name, key, "cache hit");
                return Ok(envelope.payload.clone());
            }
        }

        match fetch().await {
            Ok(payload) => {
                self.put(key, payload.clone(), epoch_ms()).await;
                debug!(cache = self.name, key, "cache refreshed");
                Ok(payload)
            }
            Err(e) if requires_login(&e) => Err(e),
            Err(e) => match cached {
                Some(envelope) => {
                    warn!(cache = self.name, key, err = %e, "fetch failed, serving stale copy");
                    Ok(envelope.payload)
                }
                None => Err(e),
            },
        }
    }
}

fn requires_login(err: &anyhow::Error) -> bool {
    err.downcast_ref::<AuthError>().is_some_and(AuthError::requires_login)
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
