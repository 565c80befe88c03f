// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access token validity check.
//!
//! Decodes the JWT payload without verifying the signature (the backend does
//! that) and reads the `exp` claim. Anything that cannot be decoded counts as
//! expired.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

/// Default lookahead before expiry at which a token is treated as stale.
pub const DEFAULT_THRESHOLD_SECS: i64 = 30;

/// Claims read from an access token. Only `exp` matters here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    /// Expiry as epoch seconds.
    pub exp: i64,
}

impl TokenClaims {
    /// Seconds left before expiry (negative once expired).
    pub fn remaining_secs(&self, now_secs: i64) -> i64 {
        self.exp.saturating_sub(now_secs)
    }
}

/// Decode the claims of `token`, or `None` if it is not a readable JWT with
/// a numeric `exp`.
pub fn claims(token: &str) -> Option<TokenClaims> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return None;
    };
    let bytes = decode_segment(payload)?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = value.as_object()?.get("exp")?;
    // Some issuers emit fractional seconds.
    let exp = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
    Some(TokenClaims { exp })
}

fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    if segment.is_empty() {
        return None;
    }
    [URL_SAFE_NO_PAD, URL_SAFE, STANDARD_NO_PAD, STANDARD]
        .iter()
        .find_map(|engine| engine.decode(segment).ok())
}

/// Whether `token` is expired or expires within `threshold_secs` of `now_secs`.
pub fn is_expired_or_near_expiry_at(token: &str, now_secs: i64, threshold_secs: i64) -> bool {
    match claims(token) {
        Some(claims) => claims.remaining_secs(now_secs) < threshold_secs,
        None => true,
    }
}

/// [`is_expired_or_near_expiry_at`] against the system clock.
pub fn is_expired_or_near_expiry(token: &str, threshold_secs: i64) -> bool {
    is_expired_or_near_expiry_at(token, epoch_secs(), threshold_secs)
}

pub fn epoch_secs() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
