//! Token manager
//!
//! Owns the validity rules of issued tokens; persistence belongs to the
//! [`TokenProvider`]. Writes (create, refresh, revoke) are serialized inside the
//! manager so that collision checks and revocations cannot interleave.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::models::token::expiry_after;
use crate::models::{Token, User};
use crate::store::TokenProvider;

use super::token::{generate_token, is_valid_token_format};

/// Token lifecycle options
#[derive(Debug, Clone, PartialEq)]
pub struct TokenOptions {
    /// How long a token stays valid after issue or refresh
    pub ttl: Duration,

    /// Replace the token string on every refresh
    pub rotate_on_refresh: bool,

    /// Allow refreshing a token that has already expired
    pub revive_expired: bool,

    /// Attempts at drawing an unused token string before giving up
    pub max_generation_attempts: u32,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(1800), // 30 minutes
            rotate_on_refresh: false,
            revive_expired: false,
            max_generation_attempts: 5,
        }
    }
}

/// Short, non-secret prefix of a token for log fields
pub(crate) fn token_hint(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

/// Token manager
pub struct TokenManager {
    provider: Arc<dyn TokenProvider>,
    options: TokenOptions,
    write_lock: Mutex<()>,
}

impl TokenManager {
    /// Create a new token manager
    pub fn new(provider: Arc<dyn TokenProvider>, options: TokenOptions) -> Self {
        Self {
            provider,
            options,
            write_lock: Mutex::new(()),
        }
    }

    /// Lifecycle options in effect
    pub fn options(&self) -> &TokenOptions {
        &self.options
    }

    /// Issue a new token for `owner`
    pub async fn create_token(&self, owner: &User) -> Result<Token, AuthError> {
        let _guard = self.write_lock.lock().await;

        let token_string = self.unused_token_string().await?;
        let token = Token::new(token_string, owner.username.as_str(), self.options.ttl);
        self.provider.save(&token).await?;

        info!(
            owner = %owner.username,
            token = token_hint(&token.token),
            expires_at = %token.expires_at,
            "Token issued"
        );
        Ok(token)
    }

    /// Find a live token by its string
    ///
    /// Returns `None` for malformed, unknown, revoked and expired tokens alike.
    pub async fn find_token(&self, token: &str) -> Result<Option<Token>, AuthError> {
        if !is_valid_token_format(token) {
            return Ok(None);
        }

        let Some(found) = self.provider.find_by_string(token).await? else {
            return Ok(None);
        };

        if found.is_expired_at(Utc::now()) {
            debug!(token = token_hint(token), "Token lookup hit an expired token");
            return Ok(None);
        }

        Ok(Some(found))
    }

    /// Extend a token's validity by the configured TTL
    ///
    /// Returns the refreshed token, whose string differs from the input when
    /// rotation is enabled.
    pub async fn refresh_token(&self, token: &Token) -> Result<Token, AuthError> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();

        let current = self
            .provider
            .find_by_string(&token.token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;
        self.check_refreshable(&current, now)
            .map_err(AuthError::conceal_expiry)?;

        let mut refreshed = current;
        refreshed.expires_at = expiry_after(now, self.options.ttl);
        refreshed.renewals = refreshed.renewals.saturating_add(1);

        if self.options.rotate_on_refresh {
            let next = self.unused_token_string().await?;
            let previous = std::mem::replace(&mut refreshed.token, next);
            self.provider.save(&refreshed).await?;
            self.provider.delete(&previous).await?;
            debug!(
                owner = %refreshed.owner,
                previous = token_hint(&previous),
                token = token_hint(&refreshed.token),
                "Token rotated"
            );
        } else {
            self.provider.save(&refreshed).await?;
        }

        debug!(
            owner = %refreshed.owner,
            renewals = refreshed.renewals,
            expires_at = %refreshed.expires_at,
            "Token refreshed"
        );
        Ok(refreshed)
    }

    /// Revoke a token; revoking an unknown token is a no-op
    pub async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let _guard = self.write_lock.lock().await;
        self.provider.delete(token).await?;
        info!(token = token_hint(token), "Token revoked");
        Ok(())
    }

    fn check_refreshable(&self, token: &Token, now: DateTime<Utc>) -> Result<(), AuthError> {
        if token.is_expired_at(now) && !self.options.revive_expired {
            return Err(AuthError::TokenExpired);
        }
        Ok(())
    }

    /// Draw token strings until one is not in the store
    ///
    /// Caller must hold the write lock.
    async fn unused_token_string(&self) -> Result<String, AuthError> {
        for attempt in 1..=self.options.max_generation_attempts {
            let candidate = generate_token();
            if self.provider.find_by_string(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            warn!(attempt, "Generated token collided with an existing token");
        }

        Err(AuthError::TokenGenerationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{InMemoryTokenProvider, MockTokenProvider};

    fn alice() -> User {
        User::new("alice", "hash")
    }

    fn create_test_manager(options: TokenOptions) -> (TokenManager, Arc<InMemoryTokenProvider>) {
        let store = Arc::new(InMemoryTokenProvider::new());
        let manager = TokenManager::new(store.clone(), options);
        (manager, store)
    }

    // Test 1: create_token persists a token bound to the owner
    #[tokio::test]
    async fn test_create_token() {
        let (manager, store) = create_test_manager(TokenOptions::default());

        let token = manager.create_token(&alice()).await.unwrap();

        assert!(token.token.starts_with("tw_"));
        assert_eq!(token.owner, "alice");
        assert_eq!(token.expires_at - token.issued_at, chrono::Duration::seconds(1800));
        assert_eq!(store.find_by_string(&token.token).await.unwrap(), Some(token));
    }

    // Test 2: find_token returns live tokens only
    #[tokio::test]
    async fn test_find_token() {
        let (manager, store) = create_test_manager(TokenOptions::default());
        let token = manager.create_token(&alice()).await.unwrap();

        assert_eq!(manager.find_token(&token.token).await.unwrap(), Some(token.clone()));

        let expired = token.with_expires_at(Utc::now() - chrono::Duration::seconds(1));
        store.save(&expired).await.unwrap();
        assert_eq!(manager.find_token(&expired.token).await.unwrap(), None);
    }

    // Test 3: malformed tokens never reach the store
    #[tokio::test]
    async fn test_find_token_bad_format() {
        let mock = MockTokenProvider::new();
        let manager = TokenManager::new(Arc::new(mock), TokenOptions::default());

        assert_eq!(manager.find_token("not_a_token").await.unwrap(), None);
    }

    // Test 4: revoke is idempotent
    #[tokio::test]
    async fn test_revoke_token() {
        let (manager, _) = create_test_manager(TokenOptions::default());
        let token = manager.create_token(&alice()).await.unwrap();

        manager.revoke_token(&token.token).await.unwrap();
        assert_eq!(manager.find_token(&token.token).await.unwrap(), None);

        assert!(manager.revoke_token(&token.token).await.is_ok());
        assert!(manager.revoke_token("tw_neverissued").await.is_ok());
    }

    // Test 5: refresh extends expiry and counts renewals
    #[tokio::test]
    async fn test_refresh_token_extends_expiry() {
        let (manager, store) = create_test_manager(TokenOptions::default());
        let token = manager.create_token(&alice()).await.unwrap();
        let shortened = token.with_expires_at(Utc::now() + chrono::Duration::seconds(5));
        store.save(&shortened).await.unwrap();

        let refreshed = manager.refresh_token(&shortened).await.unwrap();

        assert_eq!(refreshed.token, shortened.token);
        assert_eq!(refreshed.renewals, 1);
        assert!(refreshed.expires_at > shortened.expires_at);
        assert_eq!(
            store.find_by_string(&refreshed.token).await.unwrap(),
            Some(refreshed)
        );
    }

    // Test 6: refresh of a revoked token fails
    #[tokio::test]
    async fn test_refresh_revoked_token() {
        let (manager, _) = create_test_manager(TokenOptions::default());
        let token = manager.create_token(&alice()).await.unwrap();
        manager.revoke_token(&token.token).await.unwrap();

        let result = manager.refresh_token(&token).await;
        assert_eq!(result, Err(AuthError::TokenNotFound));
    }

    // Test 7: refresh of an expired token fails by default and reports not-found
    #[tokio::test]
    async fn test_refresh_expired_token_forbidden() {
        let (manager, store) = create_test_manager(TokenOptions::default());
        let token = manager
            .create_token(&alice())
            .await
            .unwrap()
            .with_expires_at(Utc::now() - chrono::Duration::seconds(1));
        store.save(&token).await.unwrap();

        let result = manager.refresh_token(&token).await;
        assert_eq!(result, Err(AuthError::TokenNotFound));
        assert_eq!(manager.find_token(&token.token).await.unwrap(), None);
    }

    // Test 8: refresh of an expired token revives it when allowed
    #[tokio::test]
    async fn test_refresh_expired_token_revived() {
        let options = TokenOptions {
            revive_expired: true,
            ..Default::default()
        };
        let (manager, store) = create_test_manager(options);
        let token = manager
            .create_token(&alice())
            .await
            .unwrap()
            .with_expires_at(Utc::now() - chrono::Duration::seconds(1));
        store.save(&token).await.unwrap();

        let refreshed = manager.refresh_token(&token).await.unwrap();
        assert_eq!(
            manager.find_token(&token.token).await.unwrap(),
            Some(refreshed)
        );
    }

    // Test 9: rotation replaces the token string and retires the old one
    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let options = TokenOptions {
            rotate_on_refresh: true,
            ..Default::default()
        };
        let (manager, store) = create_test_manager(options);
        let token = manager.create_token(&alice()).await.unwrap();

        let rotated = manager.refresh_token(&token).await.unwrap();

        assert_ne!(rotated.token, token.token);
        assert_eq!(rotated.owner, "alice");
        assert_eq!(manager.find_token(&token.token).await.unwrap(), None);
        assert!(manager.find_token(&rotated.token).await.unwrap().is_some());
        assert_eq!(store.len(), 1);
    }

    // Test 10: persistent collisions exhaust the retry bound
    #[tokio::test]
    async fn test_create_token_collision_exhausted() {
        let mut mock = MockTokenProvider::new();
        mock.expect_find_by_string()
            .times(3)
            .returning(|s| Ok(Some(Token::new(s, "someone", Duration::from_secs(60)))));
        mock.expect_save().never();

        let options = TokenOptions {
            max_generation_attempts: 3,
            ..Default::default()
        };
        let manager = TokenManager::new(Arc::new(mock), options);

        let result = manager.create_token(&alice()).await;
        assert_eq!(result, Err(AuthError::TokenGenerationFailed));
    }

    // Test 11: a single collision is retried
    #[tokio::test]
    async fn test_create_token_collision_retried() {
        let mut mock = MockTokenProvider::new();
        let mut calls = 0;
        mock.expect_find_by_string().times(2).returning(move |s| {
            calls += 1;
            if calls == 1 {
                Ok(Some(Token::new(s, "someone", Duration::from_secs(60))))
            } else {
                Ok(None)
            }
        });
        mock.expect_save().times(1).returning(|_| Ok(()));

        let manager = TokenManager::new(Arc::new(mock), TokenOptions::default());
        assert!(manager.create_token(&alice()).await.is_ok());
    }

    // Test 12: store failures propagate
    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut mock = MockTokenProvider::new();
        mock.expect_delete()
            .returning(|_| Err(StoreError::Unavailable("down".to_string())));

        let manager = TokenManager::new(Arc::new(mock), TokenOptions::default());
        let result = manager.revoke_token("tw_x").await;

        assert!(matches!(result, Err(AuthError::Store(StoreError::Unavailable(_)))));
    }

    #[test]
    fn test_token_hint_is_short() {
        assert_eq!(token_hint("tw_abcdefghijkl"), "tw_abcde");
        assert_eq!(token_hint("tw_a"), "tw_a");
    }
}
