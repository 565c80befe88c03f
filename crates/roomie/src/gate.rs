// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated request gate: the one place API calls get their token from.
//!
//! Returns the stored access token while it is valid. Once it is stale, the
//! first caller starts a refresh and every concurrent caller awaits that same
//! refresh. If all callers go away before it completes, the refresh is dropped
//! with them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::refresh::TokenRefresher;
use crate::session::{non_blank, Session, SessionStore};
use crate::token;

type RefreshFuture = Shared<BoxFuture<'static, Result<String, AuthError>>>;

struct InFlight {
    id: u64,
    fut: RefreshFuture,
}

pub struct AuthGate {
    store: Arc<SessionStore>,
    refresher: Arc<TokenRefresher>,
    threshold_secs: i64,
    in_flight: Mutex<Option<InFlight>>,
    next_id: AtomicU64,
}

impl AuthGate {
    pub fn new(
        store: Arc<SessionStore>,
        refresher: Arc<TokenRefresher>,
        threshold_secs: i64,
    ) -> Self {
        Self {
            store,
            refresher,
            threshold_secs,
            in_flight: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    /// A currently valid access token, refreshing first if needed.
    ///
    /// Fails with [`AuthError::SessionMissing`] when no valid token can be
    /// produced; the caller has to send the user back to sign-in.
    pub async fn valid_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.usable_token(&self.store.snapshot()) {
            return Ok(token);
        }

        let waiter = match self.join() {
            Joined::Fresh(token) => return Ok(token),
            Joined::Pending(waiter) => waiter,
        };
        match waiter.wait().await {
            Ok(token) => Ok(token),
            Err(e) => {
                warn!(err = %e, "session refresh failed");
                Err(AuthError::SessionMissing)
            }
        }
    }

    fn usable_token(&self, session: &Session) -> Option<String> {
        let token = non_blank(session.access_token.as_deref())?;
        if token::is_expired_or_near_expiry(token, self.threshold_secs) {
            return None;
        }
        Some(token.to_owned())
    }

    /// Join the pending refresh, or start one.
    ///
    /// The store is read again under the slot lock, so a caller that saw the
    /// old pair just before another refresh landed takes the rotated token
    /// instead of sending the spent refresh token.
    fn join(&self) -> Joined<'_> {
        let mut slot = self.in_flight.lock();
        if let Some(ref pending) = *slot {
            // A completed refresh is never reused; its token may already be stale.
            if pending.fut.peek().is_none() {
                debug!(refresh = pending.id, "joining in-flight refresh");
                return Joined::Pending(Waiter {
                    slot: &self.in_flight,
                    id: pending.id,
                    fut: pending.fut.clone(),
                });
            }
        }

        let session = self.store.snapshot();
        if let Some(token) = self.usable_token(&session) {
            debug!("token rotated by an earlier refresh");
            return Joined::Fresh(token);
        }
        if session.access_token.is_some() {
            debug!("access token stale, refreshing");
        } else {
            debug!("no access token, attempting refresh");
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let refresher = Arc::clone(&self.refresher);
        let fut = async move {
            refresher
                .refresh(session.access_token.as_deref(), session.refresh_token.as_deref())
                .await
        }
        .boxed()
        .shared();
        *slot = Some(InFlight { id, fut: fut.clone() });
        Joined::Pending(Waiter { slot: &self.in_flight, id, fut })
    }
}

enum Joined<'a> {
    /// The store already holds a valid token.
    Fresh(String),
    Pending(Waiter<'a>),
}

/// One caller's handle on a shared refresh.
struct Waiter<'a> {
    slot: &'a Mutex<Option<InFlight>>,
    id: u64,
    fut: RefreshFuture,
}

impl Waiter<'_> {
    async fn wait(mut self) -> Result<String, AuthError> {
        (&mut self.fut).await
    }
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        // The slot holds one handle and this waiter the other: nobody else is
        // waiting, so release the refresh (abandoning it if unfinished).
        let last = slot.as_ref().is_some_and(|pending| {
            pending.id == self.id && self.fut.strong_count().is_none_or(|n| n <= 2)
        });
        if last {
            slot.take();
        }
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
