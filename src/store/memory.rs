//! In-memory store implementations
//!
//! Every store keeps its records in a single map behind a `RwLock`; each
//! operation is one critical section, so per-key reads and writes are
//! linearizable.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::{AclProvider, CaptchaProvider, IdentityProvider, LoginAttemptProvider, TokenProvider};
use crate::error::StoreError;
use crate::models::{AclEntry, Challenge, LoginAttempt, Token, User};

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

/// In-memory token store
#[derive(Debug, Default)]
pub struct InMemoryTokenProvider {
    tokens: RwLock<HashMap<String, Token>>,
}

impl InMemoryTokenProvider {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired tokens
    ///
    /// Expiry is always checked on read, so calling this is optional.
    /// Returns the number of removed tokens.
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut tokens = self.tokens.write().map_err(poisoned)?;
        let now = Utc::now();
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired_at(now));
        Ok(before - tokens.len())
    }

    /// Number of stored tokens, expired ones included
    pub fn len(&self) -> usize {
        self.tokens.read().map(|t| t.len()).unwrap_or_default()
    }

    /// Check whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenProvider for InMemoryTokenProvider {
    async fn save(&self, token: &Token) -> Result<(), StoreError> {
        self.tokens
            .write()
            .map_err(poisoned)?
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find_by_string(&self, token: &str) -> Result<Option<Token>, StoreError> {
        Ok(self.tokens.read().map_err(poisoned)?.get(token).cloned())
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        self.tokens.write().map_err(poisoned)?.remove(token);
        Ok(())
    }
}

/// In-memory identity store
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryIdentityProvider {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given users
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.username.clone(), user))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }

    /// Add or replace a user
    pub fn add_user(&self, user: User) -> Result<(), StoreError> {
        self.users
            .write()
            .map_err(poisoned)?
            .insert(user.username.clone(), user);
        Ok(())
    }

    /// Remove a user
    pub fn remove_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.write().map_err(poisoned)?.remove(username))
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn load_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().map_err(poisoned)?.get(username).cloned())
    }
}

/// In-memory login attempt store
#[derive(Debug, Default)]
pub struct InMemoryLoginAttemptProvider {
    attempts: RwLock<HashMap<String, LoginAttempt>>,
}

impl InMemoryLoginAttemptProvider {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop records that no longer count under a counting window of `window`
    ///
    /// Returns the number of removed records.
    pub fn purge_stale(&self, window: Duration) -> Result<usize, StoreError> {
        let mut attempts = self.attempts.write().map_err(poisoned)?;
        let now = Utc::now();
        let before = attempts.len();
        attempts.retain(|_, attempt| !attempt.is_stale_at(now, window));
        Ok(before - attempts.len())
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.attempts.read().map(|a| a.len()).unwrap_or_default()
    }

    /// Check whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LoginAttemptProvider for InMemoryLoginAttemptProvider {
    async fn get(&self, identity: &str) -> Result<Option<LoginAttempt>, StoreError> {
        Ok(self.attempts.read().map_err(poisoned)?.get(identity).cloned())
    }

    async fn save(&self, attempt: &LoginAttempt) -> Result<(), StoreError> {
        self.attempts
            .write()
            .map_err(poisoned)?
            .insert(attempt.identity.clone(), attempt.clone());
        Ok(())
    }

    async fn delete(&self, identity: &str) -> Result<(), StoreError> {
        self.attempts.write().map_err(poisoned)?.remove(identity);
        Ok(())
    }
}

/// URL-pattern ACL source backed by a fixed list of entries
#[derive(Debug, Default, Clone)]
pub struct UrlAclProvider {
    entries: Vec<AclEntry>,
}

impl UrlAclProvider {
    /// Create a provider over entries in registration order
    pub fn new(entries: Vec<AclEntry>) -> Self {
        Self { entries }
    }

    /// Append an entry
    pub fn with_entry(mut self, entry: AclEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Registered entries
    pub fn entries(&self) -> &[AclEntry] {
        &self.entries
    }
}

#[async_trait]
impl AclProvider for UrlAclProvider {
    async fn find_matching(&self, resource: &str) -> Result<Vec<AclEntry>, StoreError> {
        let mut matching: Vec<AclEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.pattern.matches(resource))
            .cloned()
            .collect();
        // stable: equal specificity keeps registration order
        matching.sort_by(|a, b| a.pattern.cmp_specificity(&b.pattern));
        Ok(matching)
    }
}

/// In-memory captcha store
#[derive(Debug, Default)]
pub struct InMemoryCaptchaProvider {
    challenges: RwLock<HashMap<String, Challenge>>,
}

impl InMemoryCaptchaProvider {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop challenges that can no longer be answered
    ///
    /// Returns the number of removed challenges.
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut challenges = self.challenges.write().map_err(poisoned)?;
        let before = challenges.len();
        challenges.retain(|_, challenge| challenge.is_valid());
        Ok(before - challenges.len())
    }

    /// Number of stored challenges, expired ones included
    pub fn len(&self) -> usize {
        self.challenges.read().map(|c| c.len()).unwrap_or_default()
    }

    /// Check whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CaptchaProvider for InMemoryCaptchaProvider {
    async fn save(&self, challenge: &Challenge) -> Result<(), StoreError> {
        self.challenges
            .write()
            .map_err(poisoned)?
            .insert(challenge.id.clone(), challenge.clone());
        Ok(())
    }

    async fn consume(&self, id: &str) -> Result<Option<Challenge>, StoreError> {
        Ok(self.challenges.write().map_err(poisoned)?.remove(id))
    }
}
