//! Login attempt model

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token::expiry_after;

/// Failed login tracking for one identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempt {
    /// Identity key (normally the username)
    pub identity: String,

    /// Number of failures in the current window
    pub failures: u32,

    /// First failure of the current window
    pub first_failure_at: DateTime<Utc>,

    /// End of the active lock, if any
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginAttempt {
    /// Start a fresh window at `now` with no failures
    pub fn new(identity: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            identity: identity.into(),
            failures: 0,
            first_failure_at: now,
            locked_until: None,
        }
    }

    /// Check whether the lock is active at `now`
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// Check whether a lock was set and has run out at `now`
    pub fn lock_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now >= until)
    }

    /// Check whether the counting window that began at the first failure has elapsed
    pub fn window_elapsed_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now >= expiry_after(self.first_failure_at, window)
    }

    /// A record whose lock ran out, or whose window elapsed without a lock,
    /// no longer counts
    pub fn is_stale_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.lock_expired_at(now) || (!self.is_locked_at(now) && self.window_elapsed_at(now, window))
    }
}
