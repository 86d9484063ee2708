//! Login attempt tracking and lockout
//!
//! This module tracks failed logins per identity. After a configurable number
//! of failures within the counting window, the identity is locked for a
//! configurable duration.
//!
//! The attempt store only offers `get`, `save` and `delete`, so every
//! read-modify-write for one identity runs under a per-identity async mutex.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::models::token::expiry_after;
use crate::models::LoginAttempt;
use crate::store::LoginAttemptProvider;

/// Lockout policy
#[derive(Debug, Clone, PartialEq)]
pub struct LockoutConfig {
    /// Failures within the window that lock the identity
    pub max_failures: u32,

    /// How long a lock lasts
    pub lock_duration: Duration,

    /// Duration after which the failure count starts over
    pub window_duration: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            lock_duration: Duration::from_secs(900),   // 15 minutes
            window_duration: Duration::from_secs(600), // 10 minutes
        }
    }
}

/// Login attempt manager
pub struct LoginAttemptManager {
    provider: Arc<dyn LoginAttemptProvider>,
    config: LockoutConfig,
    key_locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LoginAttemptManager {
    /// Create a new login attempt manager
    pub fn new(provider: Arc<dyn LoginAttemptProvider>, config: LockoutConfig) -> Self {
        Self {
            provider,
            config,
            key_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Lockout policy in effect
    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    /// Record a failed login for an identity
    ///
    /// Returns `true` if the identity is locked after this failure.
    pub async fn record_failure(&self, identity: &str) -> Result<bool, AuthError> {
        let key_lock = self.key_lock(identity);
        let result = {
            let _guard = key_lock.lock().await;
            self.apply_failure(identity).await
        };
        self.release_key_lock(identity, key_lock);
        result
    }

    /// Forget the failures of an identity (e.g., after successful login)
    pub async fn record_success(&self, identity: &str) -> Result<(), AuthError> {
        let key_lock = self.key_lock(identity);
        let result = {
            let _guard = key_lock.lock().await;
            self.clear(identity).await
        };
        self.release_key_lock(identity, key_lock);
        result
    }

    /// Check if an identity is currently locked
    pub async fn is_locked(&self, identity: &str) -> Result<bool, AuthError> {
        let attempt = self.provider.get(identity).await?;
        Ok(attempt.is_some_and(|a| a.is_locked_at(Utc::now())))
    }

    /// Failures counted in the current window
    ///
    /// Returns 0 if no failures are recorded or the window or lock has run out.
    pub async fn failure_count(&self, identity: &str) -> Result<u32, AuthError> {
        let now = Utc::now();
        Ok(match self.provider.get(identity).await? {
            Some(attempt) if !self.is_stale(&attempt, now) => attempt.failures,
            _ => 0,
        })
    }

    async fn apply_failure(&self, identity: &str) -> Result<bool, AuthError> {
        let now = Utc::now();
        let mut attempt = match self.provider.get(identity).await? {
            Some(attempt) if !self.is_stale(&attempt, now) => attempt,
            _ => LoginAttempt::new(identity, now),
        };

        attempt.failures = attempt.failures.saturating_add(1);

        if !attempt.is_locked_at(now) && attempt.failures >= self.config.max_failures {
            attempt.locked_until = Some(expiry_after(now, self.config.lock_duration));
            warn!(
                identity,
                failures = attempt.failures,
                lock_secs = self.config.lock_duration.as_secs(),
                "Identity locked after repeated login failures"
            );
        } else {
            debug!(identity, failures = attempt.failures, "Login failure recorded");
        }

        self.provider.save(&attempt).await?;
        Ok(attempt.is_locked_at(now))
    }

    async fn clear(&self, identity: &str) -> Result<(), AuthError> {
        self.provider.delete(identity).await?;
        Ok(())
    }

    fn is_stale(&self, attempt: &LoginAttempt, now: DateTime<Utc>) -> bool {
        attempt.is_stale_at(now, self.config.window_duration)
    }

    fn key_lock(&self, identity: &str) -> Arc<Mutex<()>> {
        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(identity.to_string()).or_default())
    }

    /// Drop the per-identity mutex once no other caller holds it
    fn release_key_lock(&self, identity: &str, key_lock: Arc<Mutex<()>>) {
        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        // one reference in the map, one here
        if Arc::strong_count(&key_lock) == 2 {
            locks.remove(identity);
        }
    }

    /// Number of identities with an in-flight update
    #[cfg(test)]
    fn tracked_key_locks(&self) -> usize {
        self.key_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
