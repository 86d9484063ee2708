//! Captcha gate
//!
//! Issues single-use numeric challenges and checks answers. Rendering the
//! challenge is left to the host.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::AuthError;
use crate::models::Challenge;
use crate::store::CaptchaProvider;

use super::token::{generate_digits, generate_id};

/// Challenge policy
#[derive(Debug, Clone, PartialEq)]
pub struct CaptchaConfig {
    /// How long a challenge can be answered
    pub ttl: Duration,

    /// Number of digits in the answer
    pub answer_length: usize,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(120),
            answer_length: 6,
        }
    }
}

/// Captcha manager
pub struct CaptchaManager {
    provider: Arc<dyn CaptchaProvider>,
    config: CaptchaConfig,
}

impl CaptchaManager {
    /// Create a new captcha manager
    pub fn new(provider: Arc<dyn CaptchaProvider>, config: CaptchaConfig) -> Self {
        Self { provider, config }
    }

    /// Issue and store a new challenge
    pub async fn issue_challenge(&self) -> Result<Challenge, AuthError> {
        let challenge = Challenge::new(
            generate_id(),
            generate_digits(self.config.answer_length),
            self.config.ttl,
        );
        self.provider.save(&challenge).await?;

        debug!(challenge_id = %challenge.id, "Captcha challenge issued");
        Ok(challenge)
    }

    /// Check an answer; the challenge is consumed whatever the result
    pub async fn verify(&self, id: &str, answer: &str) -> Result<bool, AuthError> {
        let Some(challenge) = self.provider.consume(id).await? else {
            debug!(challenge_id = id, "Unknown captcha challenge");
            return Ok(false);
        };

        let passed = challenge.is_valid() && challenge.answer == answer.trim();
        debug!(challenge_id = id, passed, "Captcha challenge answered");
        Ok(passed)
    }
}
