//! Authentication providers
//!
//! Two providers ship with the crate: username/password against the identity
//! store, and bearer tokens issued by the [`TokenManager`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::features::Features;
use crate::models::{Authentication, Credentials, User};
use crate::store::IdentityProvider;

use super::chain::Outcome;
use super::lockout::LoginAttemptManager;
use super::token::{generate_token, hash_password, verify_password};
use super::token_manager::{token_hint, TokenManager};

/// One link of the authentication chain
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Try to authenticate the credentials
    ///
    /// Declines credentials of a kind the provider does not handle.
    async fn authenticate(&self, credentials: &Credentials) -> Outcome<Authentication>;
}

/// Username/password provider with lockout
pub struct UsernamePasswordAuthenticationProvider {
    identity: Arc<dyn IdentityProvider>,
    attempts: Arc<LoginAttemptManager>,
    tokens: Arc<TokenManager>,
    features: Arc<Features>,
    decoy_hash: Option<String>,
}

impl UsernamePasswordAuthenticationProvider {
    /// Create a new provider
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        attempts: Arc<LoginAttemptManager>,
        tokens: Arc<TokenManager>,
        features: Arc<Features>,
    ) -> Self {
        Self {
            identity,
            attempts,
            tokens,
            features,
            decoy_hash: hash_password(&generate_token()).ok(),
        }
    }

    async fn verify(&self, username: &str, password: &str) -> Result<Authentication, AuthError> {
        let lockout = self.features.login_attempt_enabled;

        if lockout && self.attempts.is_locked(username).await? {
            self.burn_verification(password);
            warn!(username, "Login rejected for locked identity");
            return Err(AuthError::AccountLocked);
        }

        let user = match self.identity.load_user(username).await? {
            // same answer whether or not the password was right
            Some(user) if user.locked => {
                self.burn_verification(password);
                warn!(username, "Login rejected for administratively locked user");
                return Err(AuthError::AccountLocked);
            }
            Some(user) if verify_password(password, &user.password_hash) => user,
            Some(_) => return self.reject(username).await,
            None => {
                self.burn_verification(password);
                return self.reject(username).await;
            }
        };

        if lockout {
            self.attempts.record_success(username).await?;
        }

        let token = self.tokens.create_token(&user).await?;
        info!(username, "Password authentication succeeded");
        Ok(Authentication { user, token })
    }

    async fn reject(&self, username: &str) -> Result<Authentication, AuthError> {
        debug!(username, "Password authentication failed");
        if self.features.login_attempt_enabled && self.attempts.record_failure(username).await? {
            return Err(AuthError::AccountLocked);
        }
        Err(AuthError::CredentialsInvalid)
    }

    /// Spend one hash verification so unknown and locked identities answer in
    /// about the same time as a wrong password
    fn burn_verification(&self, password: &str) {
        if let Some(hash) = &self.decoy_hash {
            let _ = verify_password(password, hash);
        }
    }
}

#[async_trait]
impl AuthenticationProvider for UsernamePasswordAuthenticationProvider {
    fn name(&self) -> &str {
        "username-password"
    }

    async fn authenticate(&self, credentials: &Credentials) -> Outcome<Authentication> {
        let Credentials::Password { username, password } = credentials else {
            return Outcome::Decline;
        };

        Outcome::from_result(self.verify(username, password).await)
    }
}

/// Bearer token provider
pub struct TokenAuthenticationProvider {
    identity: Arc<dyn IdentityProvider>,
    tokens: Arc<TokenManager>,
    refresh_on_access: bool,
}

impl TokenAuthenticationProvider {
    /// Create a new provider
    ///
    /// With `refresh_on_access`, every successful use extends the token
    /// (sliding expiry). If the token manager rotates on refresh, the returned
    /// [`Authentication`] carries the new token string.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        tokens: Arc<TokenManager>,
        refresh_on_access: bool,
    ) -> Self {
        Self {
            identity,
            tokens,
            refresh_on_access,
        }
    }

    /// Resolve a live token to its owner
    pub async fn validate(&self, token: &str) -> Result<Authentication, AuthError> {
        let found = self
            .tokens
            .find_token(token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        let user = self.load_owner(&found.owner).await?;

        let token = if self.refresh_on_access {
            self.tokens.refresh_token(&found).await?
        } else {
            found
        };

        debug!(owner = %user.username, token = token_hint(&token.token), "Bearer token accepted");
        Ok(Authentication { user, token })
    }

    async fn load_owner(&self, username: &str) -> Result<User, AuthError> {
        let user = self
            .identity
            .load_user(username)
            .await?
            .ok_or(AuthError::CredentialsInvalid)?;

        if user.locked {
            return Err(AuthError::AccountLocked);
        }
        Ok(user)
    }
}

#[async_trait]
impl AuthenticationProvider for TokenAuthenticationProvider {
    fn name(&self) -> &str {
        "bearer-token"
    }

    async fn authenticate(&self, credentials: &Credentials) -> Outcome<Authentication> {
        let Credentials::Bearer(token) = credentials else {
            return Outcome::Decline;
        };

        Outcome::from_result(self.validate(token).await)
    }
}
