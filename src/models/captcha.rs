//! Captcha challenge model

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token::expiry_after;

/// Single-use challenge issued before a login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Challenge identifier handed to the client
    pub id: String,

    /// Expected answer
    pub answer: String,

    /// When the challenge stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl Challenge {
    /// Create a challenge that lives for `ttl`
    pub fn new(id: impl Into<String>, answer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            id: id.into(),
            answer: answer.into(),
            expires_at: expiry_after(Utc::now(), ttl),
        }
    }

    /// Check whether the challenge is still accepted
    pub fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}
