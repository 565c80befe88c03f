// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session store: the single live session of this installation.
//!
//! Holds the access token, refresh token, user id and user type. Every write
//! replaces the whole record: the file is written first, then the in-memory
//! snapshot is swapped through a `watch` channel, so readers only ever see a
//! committed record. Writers are serialized by an async mutex.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use crate::persist;

/// Kind of account behind the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Roommate,
    PropertyOwner,
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Roommate => f.write_str("roommate"),
            Self::PropertyOwner => f.write_str("property_owner"),
        }
    }
}

impl std::str::FromStr for UserType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "roommate" => Ok(Self::Roommate),
            "property_owner" | "owner" => Ok(Self::PropertyOwner),
            other => anyhow::bail!("invalid user type: {other}"),
        }
    }
}

/// Persisted session record. All fields absent means logged out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        non_blank(self.access_token.as_deref()).is_some()
            && non_blank(self.refresh_token.as_deref()).is_some()
    }
}

/// Outcome of [`SessionStore::rotate_tokens`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Rotation {
    /// The new pair was written.
    Updated,
    /// Another refresh already rotated the pair; holds the stored session.
    Superseded(Session),
    /// The session was cleared while the refresh was in flight.
    LoggedOut,
}

pub struct SessionStore {
    tx: watch::Sender<Session>,
    write_lock: Mutex<()>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// Store without a backing file (tests, ephemeral runs).
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self::with_session(Session::default(), None))
    }

    /// Open the store at `path`, loading any previously saved session.
    pub fn open(path: PathBuf) -> anyhow::Result<Arc<Self>> {
        let session: Session = persist::load(&path)?.unwrap_or_default();
        debug!(path = %path.display(), logged_in = session.is_logged_in(), "session store opened");
        Ok(Arc::new(Self::with_session(session, Some(path))))
    }

    fn with_session(session: Session, path: Option<PathBuf>) -> Self {
        let (tx, _rx) = watch::channel(session);
        Self { tx, write_lock: Mutex::new(()), path }
    }

    /// Persist all four session fields as one record.
    pub async fn save_session(
        &self,
        access_token: String,
        refresh_token: String,
        user_id: Option<String>,
        user_type: Option<UserType>,
    ) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        self.commit(Session {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            user_id,
            user_type,
        })?;
        info!(user = ?self.user_id(), "session saved");
        Ok(())
    }

    /// Replace the token pair, keeping the stored identity.
    ///
    /// `expected_refresh` is the refresh token the caller exchanged. If the
    /// stored one differs, a concurrent refresh won and nothing is written.
    pub(crate) async fn rotate_tokens(
        &self,
        expected_refresh: &str,
        access_token: String,
        refresh_token: String,
    ) -> anyhow::Result<Rotation> {
        let _guard = self.write_lock.lock().await;
        let current = self.snapshot();
        match current.refresh_token.as_deref() {
            None => return Ok(Rotation::LoggedOut),
            Some(stored) if stored != expected_refresh => {
                return Ok(Rotation::Superseded(current));
            }
            Some(_) => {}
        }
        self.commit(Session {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            user_id: current.user_id,
            user_type: current.user_type,
        })?;
        Ok(Rotation::Updated)
    }

    /// Drop the session (logout).
    pub async fn clear(&self) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        self.commit(Session::default())?;
        info!("session cleared");
        Ok(())
    }

    /// Write-through; callers must hold `write_lock`.
    fn commit(&self, session: Session) -> anyhow::Result<()> {
        if let Some(ref path) = self.path {
            persist::save(path, &session)?;
        }
        self.tx.send_replace(session);
        Ok(())
    }

    /// The latest committed record.
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Change feed of committed records.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub fn access_token(&self) -> Option<String> {
        self.tx.borrow().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tx.borrow().refresh_token.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.tx.borrow().user_id.clone()
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.tx.borrow().user_type
    }
}

/// `Some(s)` unless `s` is absent or whitespace only.
pub fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
