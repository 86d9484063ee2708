//! Token domain model
//!
//! A token is an opaque bearer credential bound to its owner by username.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issued bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Opaque token string, unique across the store
    pub token: String,

    /// Username of the owning principal
    pub owner: String,

    /// When the token was issued
    pub issued_at: DateTime<Utc>,

    /// When the token stops authenticating
    pub expires_at: DateTime<Utc>,

    /// Number of times the token has been refreshed
    pub renewals: u32,
}

impl Token {
    /// Create a token issued now that lives for `ttl`
    pub fn new(token: impl Into<String>, owner: impl Into<String>, ttl: Duration) -> Self {
        let issued_at = Utc::now();
        Self {
            token: token.into(),
            owner: owner.into(),
            issued_at,
            expires_at: expiry_after(issued_at, ttl),
            renewals: 0,
        }
    }

    /// Override the expiry time
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Check whether the token has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Check whether the token is still within its validity window
    pub fn is_valid(&self) -> bool {
        !self.is_expired_at(Utc::now())
    }
}

/// Add a std duration to a timestamp, saturating at the maximum representable time
pub(crate) fn expiry_after(from: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|delta| from.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
