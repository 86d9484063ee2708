//! Security context
//!
//! Builds every engine from one [`Config`] with in-memory backends and wires the
//! provider chains in their documented order.

use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::{
    AuthenticationManager, CaptchaManager, LoginAttemptManager, TokenAuthenticationProvider,
    TokenManager, UsernamePasswordAuthenticationProvider,
};
use crate::authz::{AuthorizationManager, Decision, RoleVoter, UrlAuthorizationProvider, UserVoter};
use crate::config::{Config, ConfigError};
use crate::error::{AuthError, StoreError};
use crate::features::Features;
use crate::federation::{FederationService, SimpleFederationProvider};
use crate::i18n::DefaultMessageProvider;
use crate::models::{AccessRequest, Authentication, Credentials};
use crate::session::LoginFlow;
use crate::store::{
    InMemoryCaptchaProvider, InMemoryIdentityProvider, InMemoryLoginAttemptProvider,
    InMemoryTokenProvider, UrlAclProvider,
};

/// Fully wired engines sharing one set of stores
pub struct SecurityContext {
    pub features: Arc<Features>,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub token_store: Arc<InMemoryTokenProvider>,
    pub token_manager: Arc<TokenManager>,
    pub attempt_store: Arc<InMemoryLoginAttemptProvider>,
    pub attempts: Arc<LoginAttemptManager>,
    pub captcha_store: Arc<InMemoryCaptchaProvider>,
    pub captcha: Arc<CaptchaManager>,
    pub authentication: Arc<AuthenticationManager>,
    pub authorization: Arc<AuthorizationManager>,
    pub federation: Arc<FederationService>,
    pub messages: Arc<DefaultMessageProvider>,
    pub login: LoginFlow,
}

impl SecurityContext {
    /// Validate `config` and build the engines
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let features = Arc::new(config.features());
        let identity = Arc::new(InMemoryIdentityProvider::with_users(config.users.iter().cloned()));
        let token_store = Arc::new(InMemoryTokenProvider::new());

        let token_manager = Arc::new(TokenManager::new(token_store.clone(), config.token_options()));
        let attempt_store = Arc::new(InMemoryLoginAttemptProvider::new());
        let attempts = Arc::new(LoginAttemptManager::new(
            attempt_store.clone(),
            config.lockout_config(),
        ));
        let captcha_store = Arc::new(InMemoryCaptchaProvider::new());
        let captcha = Arc::new(CaptchaManager::new(
            captcha_store.clone(),
            config.captcha_config(),
        ));

        let bearer = Arc::new(TokenAuthenticationProvider::new(
            identity.clone(),
            token_manager.clone(),
            config.token.refresh_on_access,
        ));

        let authentication = Arc::new(
            AuthenticationManager::new(token_manager.clone())
                .with_provider(Arc::new(UsernamePasswordAuthenticationProvider::new(
                    identity.clone(),
                    attempts.clone(),
                    token_manager.clone(),
                    features.clone(),
                )))
                .with_provider(bearer.clone()),
        );

        let authorization = Arc::new(
            AuthorizationManager::new(features.default_policy).with_provider(Arc::new(
                UrlAuthorizationProvider::new(Arc::new(UrlAclProvider::new(config.acl.clone())))
                    .with_voter(Arc::new(RoleVoter))
                    .with_voter(Arc::new(UserVoter)),
            )),
        );

        let federation = Arc::new(
            FederationService::new(features.federation_enabled)
                .with_provider(Arc::new(SimpleFederationProvider::new(
                    config.federation.trusted_issuers.iter().cloned(),
                    identity.clone(),
                    token_manager.clone(),
                )))
                .with_provider(bearer),
        );

        let messages = Arc::new(DefaultMessageProvider::new().with_bundles(config.messages.clone()));
        let login = LoginFlow::new(authentication.clone(), captcha.clone(), features.clone());

        info!(
            users = config.users.len(),
            acl_entries = config.acl.len(),
            lockout = features.login_attempt_enabled,
            captcha = features.captcha_enabled,
            federation = features.federation_enabled,
            "Security context initialized"
        );

        Ok(Self {
            features,
            identity,
            token_store,
            token_manager,
            attempt_store,
            attempts,
            captcha_store,
            captcha,
            authentication,
            authorization,
            federation,
            messages,
            login,
        })
    }

    /// Authenticate the credentials, then authorize the resulting principal
    pub async fn check_access(
        &self,
        credentials: &Credentials,
        resource: &str,
        action: Option<&str>,
    ) -> Result<(Authentication, Decision), AuthError> {
        let auth = self.authentication.authenticate(credentials).await?;

        let mut request = AccessRequest::new(auth.user.clone(), resource);
        if let Some(action) = action {
            request = request.with_action(action);
        }

        let decision = self.authorization.decide(&request).await?;
        Ok((auth, decision))
    }

    /// Evict expired tokens, stale login attempts and unanswered challenges
    ///
    /// Hosts call this periodically. Returns the number of removed records.
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        let tokens = self.token_store.purge_expired()?;
        let attempts = self
            .attempt_store
            .purge_stale(self.attempts.config().window_duration)?;
        let challenges = self.captcha_store.purge_expired()?;

        debug!(tokens, attempts, challenges, "Purged expired records");
        Ok(tokens + attempts + challenges)
    }
}
