//! Authorization manager
//!
//! Consults every [`AuthorizationProvider`] in order. A denial from any
//! provider rejects at once. Otherwise a grant from any provider allows. Rules
//! that matched without granting deny, and when no provider had a matching rule
//! the default policy decides.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::AuthError;
use crate::features::DefaultPolicy;
use crate::models::AccessRequest;

use super::provider::{AuthorizationProvider, Verdict};

/// How an allowed request was allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A provider granted access
    Granted,
    /// No provider matched and the default policy permits
    DefaultPermit,
}

/// Authorization manager
pub struct AuthorizationManager {
    providers: Vec<Arc<dyn AuthorizationProvider>>,
    default_policy: DefaultPolicy,
}

impl AuthorizationManager {
    /// Create a manager with an empty chain
    pub fn new(default_policy: DefaultPolicy) -> Self {
        Self {
            providers: Vec::new(),
            default_policy,
        }
    }

    /// Append a provider
    pub fn with_provider(mut self, provider: Arc<dyn AuthorizationProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Policy applied when no provider matched
    pub fn default_policy(&self) -> DefaultPolicy {
        self.default_policy
    }

    /// Decide whether the principal may access the resource
    pub async fn decide(&self, request: &AccessRequest) -> Result<Decision, AuthError> {
        let mut granted = false;
        let mut matched = false;

        for provider in &self.providers {
            match provider.authorize(request).await {
                Verdict::Denied(err) => {
                    warn!(
                        provider = provider.name(),
                        username = %request.principal.username,
                        resource = %request.resource,
                        error = %err,
                        "Access denied"
                    );
                    return Err(err);
                }
                Verdict::Granted => granted = true,
                Verdict::NotGranted => matched = true,
                Verdict::NoMatch => {}
            }
        }

        if granted {
            debug!(username = %request.principal.username, resource = %request.resource, "Access granted");
            return Ok(Decision::Granted);
        }

        if matched {
            warn!(
                username = %request.principal.username,
                resource = %request.resource,
                "Matching rules granted nothing"
            );
            return Err(AuthError::AccessDenied);
        }

        match self.default_policy {
            DefaultPolicy::Permit => {
                debug!(resource = %request.resource, "No rule matched, default policy permits");
                Ok(Decision::DefaultPermit)
            }
            DefaultPolicy::Deny => {
                warn!(
                    username = %request.principal.username,
                    resource = %request.resource,
                    "No rule matched, default policy denies"
                );
                Err(AuthError::AccessDenied)
            }
        }
    }
}
