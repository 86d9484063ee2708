//! Error types for token-warden
//!
//! Every engine reports failures through [`AuthError`]. Storage backends report
//! through [`StoreError`], which managers propagate unchanged inside
//! [`AuthError::Store`]. All error types use `thiserror`.

use thiserror::Error;

use crate::config::ConfigError;

/// Failures produced by the authentication, authorization, token and
/// federation engines
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    /// Unknown identity or wrong secret
    #[error("Invalid credentials")]
    CredentialsInvalid,

    /// No provider in the chain accepted or handled the input
    #[error("No applicable provider")]
    NoApplicableProvider,

    /// Identity is locked, either by the lockout policy or by its user record
    #[error("Account locked")]
    AccountLocked,

    /// Token does not exist, was revoked or has expired
    #[error("Token not found")]
    TokenNotFound,

    /// Token exists but has expired
    ///
    /// Never returned by the public token operations, which report
    /// [`AuthError::TokenNotFound`] instead.
    #[error("Token expired")]
    TokenExpired,

    /// A unique token string could not be produced within the retry bound
    #[error("Token generation failed")]
    TokenGenerationFailed,

    /// The principal may not access the requested resource
    #[error("Access denied")]
    AccessDenied,

    /// No federation provider accepted the presented token
    #[error("Unfederatable token")]
    UnfederatableToken,

    /// Captcha challenge missing, wrong, already used or expired
    #[error("Challenge invalid or expired")]
    ChallengeInvalidOrExpired,

    /// Backing store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Message key used by failure handlers to look up localized text
    pub fn message_key(&self) -> &'static str {
        match self {
            AuthError::CredentialsInvalid => "auth.credentials_invalid",
            AuthError::NoApplicableProvider => "auth.no_applicable_provider",
            AuthError::AccountLocked => "auth.account_locked",
            AuthError::TokenNotFound | AuthError::TokenExpired => "token.not_found",
            AuthError::TokenGenerationFailed => "token.generation_failed",
            AuthError::AccessDenied => "authz.access_denied",
            AuthError::UnfederatableToken => "federation.unfederatable_token",
            AuthError::ChallengeInvalidOrExpired => "captcha.invalid_or_expired",
            AuthError::Store(_) => "store.unavailable",
        }
    }

    /// Hide the expired/missing distinction from callers
    pub(crate) fn conceal_expiry(self) -> Self {
        match self {
            AuthError::TokenExpired => AuthError::TokenNotFound,
            other => other,
        }
    }
}

/// Storage backend errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// Backend could not be reached or failed internally
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Write rejected because of a conflicting record
    #[error("Store conflict: {0}")]
    Conflict(String),
}

/// Application-level error type used by the binary
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication or authorization failure
    #[error("Security error: {0}")]
    Auth(#[from] AuthError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: Error message formatting
    #[test]
    fn test_auth_error_messages() {
        assert_eq!(AuthError::CredentialsInvalid.to_string(), "Invalid credentials");
        assert_eq!(AuthError::AccountLocked.to_string(), "Account locked");
        assert_eq!(AuthError::TokenNotFound.to_string(), "Token not found");
        assert_eq!(AuthError::AccessDenied.to_string(), "Access denied");
        assert_eq!(
            AuthError::UnfederatableToken.to_string(),
            "Unfederatable token"
        );
        assert_eq!(
            AuthError::ChallengeInvalidOrExpired.to_string(),
            "Challenge invalid or expired"
        );
    }

    // Test 2: Store errors convert into AuthError
    #[test]
    fn test_auth_error_from_store_error() {
        let err: AuthError = StoreError::Unavailable("down".to_string()).into();
        assert_eq!(err.to_string(), "Store error: Store unavailable: down");
        assert!(matches!(err, AuthError::Store(StoreError::Unavailable(_))));
    }

    // Test 3: Expiry is concealed as not-found
    #[test]
    fn test_conceal_expiry() {
        assert_eq!(
            AuthError::TokenExpired.conceal_expiry(),
            AuthError::TokenNotFound
        );
        assert_eq!(
            AuthError::AccessDenied.conceal_expiry(),
            AuthError::AccessDenied
        );
    }

    // Test 4: Expired and missing tokens share a message key
    #[test]
    fn test_message_keys() {
        assert_eq!(
            AuthError::TokenExpired.message_key(),
            AuthError::TokenNotFound.message_key()
        );
        assert_eq!(AuthError::AccountLocked.message_key(), "auth.account_locked");
        assert_eq!(
            AuthError::Store(StoreError::Conflict("x".to_string())).message_key(),
            "store.unavailable"
        );
    }

    // Test 5: AppError display includes source error
    #[test]
    fn test_app_error_display() {
        let app_err: AppError = AuthError::AccessDenied.into();
        assert_eq!(app_err.to_string(), "Security error: Access denied");

        let app_err = AppError::Config(ConfigError::InvalidValue("ttl".to_string()));
        assert_eq!(
            app_err.to_string(),
            "Configuration error: Invalid configuration value: ttl"
        );
    }
}
