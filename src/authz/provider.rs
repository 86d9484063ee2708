//! Authorization providers

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AuthError;
use crate::models::{AccessRequest, AclEntry};
use crate::store::AclProvider;

use super::voter::{AccessVoter, Vote};

/// What one provider concluded about a request
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// No rule applies to the request
    NoMatch,
    /// Rules matched but none granted
    NotGranted,
    /// A rule granted access
    Granted,
    /// A rule denied access, or the provider failed
    Denied(AuthError),
}

/// One link of the authorization chain
#[async_trait]
pub trait AuthorizationProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Decide on a request
    async fn authorize(&self, request: &AccessRequest) -> Verdict;
}

/// ACL-backed provider keyed by URL pattern
pub struct UrlAuthorizationProvider {
    acl: Arc<dyn AclProvider>,
    voters: Vec<Arc<dyn AccessVoter>>,
}

impl UrlAuthorizationProvider {
    /// Create a provider without voters
    pub fn new(acl: Arc<dyn AclProvider>) -> Self {
        Self {
            acl,
            voters: Vec::new(),
        }
    }

    /// Append a voter
    pub fn with_voter(mut self, voter: Arc<dyn AccessVoter>) -> Self {
        self.voters.push(voter);
        self
    }

    async fn evaluate(&self, request: &AccessRequest) -> Result<Verdict, AuthError> {
        let entries: Vec<AclEntry> = self
            .acl
            .find_matching(&request.resource)
            .await?
            .into_iter()
            .filter(|e| e.applies_to(&request.resource, request.action.as_deref()))
            .collect();

        let Some(most_specific) = entries.first().map(|e| e.pattern.clone()) else {
            return Ok(Verdict::NoMatch);
        };

        let mut granted = false;
        for entry in &entries {
            let top_tier = entry.pattern.cmp_specificity(&most_specific) == Ordering::Equal;

            for voter in &self.voters {
                match voter.vote(entry, request) {
                    Vote::Deny => {
                        debug!(
                            voter = voter.name(),
                            pattern = %entry.pattern,
                            username = %request.principal.username,
                            "Voter denied access"
                        );
                        return Ok(Verdict::Denied(AuthError::AccessDenied));
                    }
                    Vote::Grant if top_tier => granted = true,
                    Vote::Grant | Vote::Abstain => {}
                }
            }
        }

        if granted {
            Ok(Verdict::Granted)
        } else {
            debug!(
                pattern = %most_specific,
                username = %request.principal.username,
                "No voter granted access"
            );
            Ok(Verdict::NotGranted)
        }
    }
}

#[async_trait]
impl AuthorizationProvider for UrlAuthorizationProvider {
    fn name(&self) -> &str {
        "url-acl"
    }

    async fn authorize(&self, request: &AccessRequest) -> Verdict {
        self.evaluate(request).await.unwrap_or_else(Verdict::Denied)
    }
}
