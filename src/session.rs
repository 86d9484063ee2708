//! Login and logout
//!
//! Composes the captcha gate with password authentication the way a login
//! endpoint would.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::{AuthenticationManager, CaptchaManager};
use crate::error::AuthError;
use crate::features::Features;
use crate::models::{Authentication, Challenge, Credentials};

/// Answer to a previously issued captcha challenge
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChallengeAnswer {
    pub id: String,
    pub answer: String,
}

/// Login form
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub challenge: Option<ChallengeAnswer>,
}

impl LoginRequest {
    /// Login without a captcha answer
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            challenge: None,
        }
    }

    /// Attach a captcha answer
    pub fn with_challenge(mut self, id: impl Into<String>, answer: impl Into<String>) -> Self {
        self.challenge = Some(ChallengeAnswer {
            id: id.into(),
            answer: answer.into(),
        });
        self
    }
}

/// Login flow
pub struct LoginFlow {
    authentication: Arc<AuthenticationManager>,
    captcha: Arc<CaptchaManager>,
    features: Arc<Features>,
}

impl LoginFlow {
    /// Create a login flow
    pub fn new(
        authentication: Arc<AuthenticationManager>,
        captcha: Arc<CaptchaManager>,
        features: Arc<Features>,
    ) -> Self {
        Self {
            authentication,
            captcha,
            features,
        }
    }

    /// Issue a challenge to show before the login form
    pub async fn issue_challenge(&self) -> Result<Challenge, AuthError> {
        self.captcha.issue_challenge().await
    }

    /// Check the captcha (when enabled), then authenticate the password
    pub async fn login(&self, request: &LoginRequest) -> Result<Authentication, AuthError> {
        if self.features.captcha_enabled {
            let Some(challenge) = &request.challenge else {
                debug!(username = %request.username, "Login without captcha answer");
                return Err(AuthError::ChallengeInvalidOrExpired);
            };
            if !self.captcha.verify(&challenge.id, &challenge.answer).await? {
                warn!(username = %request.username, "Login with failed captcha");
                return Err(AuthError::ChallengeInvalidOrExpired);
            }
        }

        let credentials = Credentials::password(request.username.as_str(), request.password.as_str());
        self.authentication.authenticate(&credentials).await
    }

    /// End a session
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.authentication.logout(token).await
    }
}
