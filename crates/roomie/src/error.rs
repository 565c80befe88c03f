// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure kinds of the session pipeline.
///
/// Everything outside the token lifecycle (I/O, JSON, HTTP status of regular
/// API calls) travels as `anyhow::Error`; these codes are what callers match on
/// to decide whether the user has to sign in again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthError {
    /// No token pair to refresh with.
    MissingCredentials,
    /// The backend answered 200 but the body was unusable.
    MalformedResponse,
    /// Transport-level failure (connect, timeout, reset).
    NetworkFailure,
    /// The backend answered with a non-200 status.
    Rejected,
    /// The new token pair could not be persisted.
    Storage,
    /// Terminal: no usable session, the user must authenticate again.
    SessionMissing,
}

impl AuthError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "MISSING_CREDENTIALS",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::NetworkFailure => "NETWORK_FAILURE",
            Self::Rejected => "REJECTED",
            Self::Storage => "STORAGE",
            Self::SessionMissing => "SESSION_MISSING",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "no token pair to refresh with",
            Self::MalformedResponse => "auth endpoint returned an unusable body",
            Self::NetworkFailure => "auth request failed in transport",
            Self::Rejected => "auth endpoint rejected the request",
            Self::Storage => "could not persist session",
            Self::SessionMissing => "cannot refresh session",
        }
    }

    /// Whether the caller should route the user back to sign-in.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::MissingCredentials | Self::SessionMissing)
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.as_str(), self.message())
    }
}

impl std::error::Error for AuthError {}

impl From<reqwest::Error> for AuthError {
    fn from(_: reqwest::Error) -> Self {
        Self::NetworkFailure
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
