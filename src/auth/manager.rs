//! Authentication manager
//!
//! Runs credentials through an ordered chain of [`AuthenticationProvider`]s.
//! The first provider that accepts ends the chain. Rejections do not stop the
//! chain, but the most recent one is what the caller sees if nobody accepts.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::models::{Authentication, Credentials};

use super::chain::ChainFold;
use super::providers::AuthenticationProvider;
use super::token_manager::{token_hint, TokenManager};

/// Authentication manager
pub struct AuthenticationManager {
    providers: Vec<Arc<dyn AuthenticationProvider>>,
    token_manager: Arc<TokenManager>,
}

impl AuthenticationManager {
    /// Create a manager with an empty chain
    pub fn new(token_manager: Arc<TokenManager>) -> Self {
        Self {
            providers: Vec::new(),
            token_manager,
        }
    }

    /// Append a provider to the chain
    pub fn with_provider(mut self, provider: Arc<dyn AuthenticationProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Append a provider to the chain
    pub fn add_provider(&mut self, provider: Arc<dyn AuthenticationProvider>) {
        self.providers.push(provider);
    }

    /// Provider names in chain order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Token manager backing this chain
    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.token_manager
    }

    /// Resolve credentials to an authenticated principal
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Authentication, AuthError> {
        let mut fold = ChainFold::new();

        for provider in &self.providers {
            let outcome = provider.authenticate(credentials).await;
            debug!(provider = provider.name(), outcome = outcome.label(), "Authentication provider consulted");

            if let Some(auth) = fold.observe(outcome) {
                info!(
                    provider = provider.name(),
                    username = %auth.user.username,
                    "Authentication succeeded"
                );
                return Ok(auth);
            }
        }

        let rejections = fold.rejections();
        let err = fold.finish();
        warn!(rejections, error = %err, "Authentication failed");
        Err(err)
    }

    /// Revoke the token of a session
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.token_manager.revoke_token(token).await?;
        debug!(token = token_hint(token), "Logged out");
        Ok(())
    }
}
