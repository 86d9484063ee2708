//! Federation service

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::ChainFold;
use crate::error::AuthError;
use crate::models::Authentication;

use super::{FederationProvider, FederationRequest};

/// Federation service
///
/// Runs the request through the providers in order; the first acceptance wins.
/// Anything short of an acceptance surfaces as
/// [`AuthError::UnfederatableToken`], except store failures which pass through.
pub struct FederationService {
    providers: Vec<Arc<dyn FederationProvider>>,
    enabled: bool,
}

impl FederationService {
    /// Create a service with an empty chain
    pub fn new(enabled: bool) -> Self {
        Self {
            providers: Vec::new(),
            enabled,
        }
    }

    /// Append a provider
    pub fn with_provider(mut self, provider: Arc<dyn FederationProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Whether federation requests are served
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Exchange a presented token for a local authentication
    pub async fn federate(&self, request: &FederationRequest) -> Result<Authentication, AuthError> {
        if !self.enabled {
            debug!("Federation request while federation is disabled");
            return Err(AuthError::UnfederatableToken);
        }

        let mut fold = ChainFold::new();
        for provider in &self.providers {
            let outcome = provider.federate(request).await;
            debug!(provider = provider.name(), outcome = outcome.label(), "Federation provider consulted");

            if let Some(auth) = fold.observe(outcome) {
                info!(
                    provider = provider.name(),
                    issuer = request.issuer.as_deref().unwrap_or("local"),
                    owner = %auth.user.username,
                    "Federation succeeded"
                );
                return Ok(auth);
            }
        }

        match fold.finish() {
            err @ AuthError::Store(_) => Err(err),
            err => {
                warn!(
                    issuer = request.issuer.as_deref().unwrap_or("local"),
                    cause = %err,
                    "Token is not federatable"
                );
                Err(AuthError::UnfederatableToken)
            }
        }
    }
}
