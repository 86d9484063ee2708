//! Failure messages
//!
//! Failure handlers turn an [`AuthError`] into user-facing text through a
//! [`MessageProvider`], keyed by [`AuthError::message_key`].

use std::collections::HashMap;

use crate::error::AuthError;

/// Locale used when a request names none
pub const DEFAULT_LOCALE: &str = "en";

const ENGLISH: &[(&str, &str)] = &[
    ("auth.credentials_invalid", "Invalid username or password."),
    ("auth.no_applicable_provider", "These credentials are not supported."),
    ("auth.account_locked", "This account is temporarily locked. Try again later."),
    ("token.not_found", "The session has expired or is invalid. Please sign in again."),
    ("token.generation_failed", "A session could not be created. Please try again."),
    ("authz.access_denied", "You are not allowed to access this resource."),
    ("federation.unfederatable_token", "The presented token cannot be exchanged."),
    ("captcha.invalid_or_expired", "The verification code is wrong or has expired."),
    ("store.unavailable", "The service is temporarily unavailable."),
];

/// Resolves message keys to localized text
pub trait MessageProvider: Send + Sync {
    /// Text for `key` in `locale`
    fn resolve(&self, key: &str, locale: &str) -> String;

    /// Text describing a failure
    fn describe(&self, err: &AuthError, locale: &str) -> String {
        self.resolve(err.message_key(), locale)
    }
}

/// Bundled English texts plus per-locale overrides
///
/// Lookup order: requested locale, default locale, then the key itself.
#[derive(Debug, Clone)]
pub struct DefaultMessageProvider {
    default_locale: String,
    bundles: HashMap<String, HashMap<String, String>>,
}

impl DefaultMessageProvider {
    /// Provider with the bundled English texts
    pub fn new() -> Self {
        let english = ENGLISH
            .iter()
            .map(|(key, text)| (key.to_string(), text.to_string()))
            .collect();

        Self {
            default_locale: DEFAULT_LOCALE.to_string(),
            bundles: HashMap::from([(DEFAULT_LOCALE.to_string(), english)]),
        }
    }

    /// Override or add texts for a locale
    pub fn with_messages(mut self, locale: impl Into<String>, messages: HashMap<String, String>) -> Self {
        self.bundles.entry(locale.into()).or_default().extend(messages);
        self
    }

    /// Add overrides for several locales
    pub fn with_bundles(self, bundles: HashMap<String, HashMap<String, String>>) -> Self {
        bundles
            .into_iter()
            .fold(self, |provider, (locale, messages)| provider.with_messages(locale, messages))
    }

    fn lookup(&self, key: &str, locale: &str) -> Option<&String> {
        self.bundles.get(locale)?.get(key)
    }
}

impl Default for DefaultMessageProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageProvider for DefaultMessageProvider {
    fn resolve(&self, key: &str, locale: &str) -> String {
        self.lookup(key, locale)
            .or_else(|| self.lookup(key, &self.default_locale))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
