//! Trusted-peer federation

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::auth::{Outcome, TokenManager};
use crate::error::AuthError;
use crate::models::Authentication;
use crate::store::IdentityProvider;

use super::{FederationProvider, FederationRequest};

/// Accepts tokens from a fixed set of trusted issuers and mints a local token
/// for the same owner
pub struct SimpleFederationProvider {
    trusted_issuers: BTreeSet<String>,
    identity: Arc<dyn IdentityProvider>,
    tokens: Arc<TokenManager>,
}

impl SimpleFederationProvider {
    /// Create a provider trusting `trusted_issuers`
    pub fn new<I, S>(trusted_issuers: I, identity: Arc<dyn IdentityProvider>, tokens: Arc<TokenManager>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trusted_issuers: trusted_issuers.into_iter().map(Into::into).collect(),
            identity,
            tokens,
        }
    }

    async fn exchange(&self, issuer: &str, token: &str) -> Result<Authentication, AuthError> {
        let presented = self
            .tokens
            .find_token(token)
            .await?
            .ok_or(AuthError::UnfederatableToken)?;

        let user = self
            .identity
            .load_user(&presented.owner)
            .await?
            .ok_or(AuthError::UnfederatableToken)?;
        if user.locked {
            return Err(AuthError::AccountLocked);
        }

        let token = self.tokens.create_token(&user).await?;
        info!(issuer, owner = %user.username, "Federated token exchanged");
        Ok(Authentication { user, token })
    }
}

#[async_trait]
impl FederationProvider for SimpleFederationProvider {
    fn name(&self) -> &str {
        "simple"
    }

    async fn federate(&self, request: &FederationRequest) -> Outcome<Authentication> {
        match request.issuer.as_deref() {
            Some(issuer) if self.trusted_issuers.contains(issuer) => {
                Outcome::from_result(self.exchange(issuer, &request.token).await)
            }
            _ => Outcome::Decline,
        }
    }
}
