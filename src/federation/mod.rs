//! Federation
//!
//! Exchanges a token presented by a cooperating system for a local session.

pub mod service;
pub mod simple;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::{Outcome, TokenAuthenticationProvider};
use crate::models::Authentication;

pub use service::FederationService;
pub use simple::SimpleFederationProvider;

/// Token presented for federation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationRequest {
    /// Presented token string
    pub token: String,

    /// Trust domain that issued the token; `None` for local tokens
    #[serde(default)]
    pub issuer: Option<String>,
}

impl FederationRequest {
    /// Request for a locally issued token
    pub fn local(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            issuer: None,
        }
    }

    /// Request for a token issued by a peer
    pub fn from_issuer(token: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            issuer: Some(issuer.into()),
        }
    }
}

/// One link of the federation chain
#[async_trait]
pub trait FederationProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Try to exchange the presented token
    async fn federate(&self, request: &FederationRequest) -> Outcome<Authentication>;
}

#[async_trait]
impl FederationProvider for TokenAuthenticationProvider {
    fn name(&self) -> &str {
        "bearer-token"
    }

    async fn federate(&self, request: &FederationRequest) -> Outcome<Authentication> {
        if request.issuer.is_some() {
            return Outcome::Decline;
        }
        Outcome::from_result(self.validate(&request.token).await)
    }
}
