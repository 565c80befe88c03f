// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the roomie client.
#[derive(Debug, Clone, clap::Args)]
pub struct ClientConfig {
    /// Backend origin, including any API prefix.
    #[arg(long, default_value = "http://127.0.0.1:8080/api", env = "ROOMIE_BASE_URL")]
    pub base_url: String,

    /// Directory holding the session file and caches.
    #[arg(long, env = "ROOMIE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Refresh the access token when it expires within this many seconds.
    #[arg(long, default_value_t = 30, env = "ROOMIE_REFRESH_THRESHOLD_SECS")]
    pub refresh_threshold_secs: i64,

    /// Timeout for each HTTP request in milliseconds.
    #[arg(long, default_value_t = 10000, env = "ROOMIE_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// Max age of cached property details in milliseconds.
    #[arg(long, default_value_t = 3_600_000, env = "ROOMIE_PROPERTY_CACHE_MAX_AGE_MS")]
    pub property_cache_max_age_ms: u64,

    /// Max age of cached match lists in milliseconds.
    #[arg(long, default_value_t = 300_000, env = "ROOMIE_MATCH_CACHE_MAX_AGE_MS")]
    pub match_cache_max_age_ms: u64,

    /// Max age of cached likes in milliseconds.
    #[arg(long, default_value_t = 300_000, env = "ROOMIE_LIKE_CACHE_MAX_AGE_MS")]
    pub like_cache_max_age_ms: u64,
}

impl ClientConfig {
    /// Defaults for a given backend, without reading argv or env.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state_dir: None,
            refresh_threshold_secs: crate::token::DEFAULT_THRESHOLD_SECS,
            request_timeout_ms: 10000,
            property_cache_max_age_ms: 3_600_000,
            match_cache_max_age_ms: 300_000,
            like_cache_max_age_ms: 300_000,
        }
    }

    /// Base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Resolve the state directory.
    ///
    /// Checks `--state-dir`/`ROOMIE_STATE_DIR`, then `$XDG_STATE_HOME/roomie`,
    /// then `$HOME/.local/state/roomie`.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.state_dir {
            return dir.clone();
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return PathBuf::from(xdg).join("roomie");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local/state/roomie");
        }
        PathBuf::from(".roomie")
    }

    pub fn session_path(&self) -> PathBuf {
        self.state_dir().join("session.json")
    }

    pub fn cache_path(&self, name: &str) -> PathBuf {
        self.state_dir().join("cache").join(format!("{name}.json"))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
