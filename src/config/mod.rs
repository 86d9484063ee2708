//! Configuration management for token-warden
//!
//! This module handles loading, parsing, and validating configuration from YAML
//! files and environment variables. Every field has a default, so an empty
//! document is a valid configuration.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use argon2::PasswordHash;
use serde::{Deserialize, Serialize};

use crate::auth::{LockoutConfig, TokenOptions};
use crate::features::{DefaultPolicy, Features};
use crate::models::{AclEntry, User};

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "TOKEN_WARDEN_";

/// Main configuration
///
/// Load-only: user password hashes are never serialized, so there is no way to
/// write a configuration back out.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    /// Token lifecycle
    #[serde(default)]
    pub token: TokenConfig,

    /// Failed login tracking
    #[serde(default)]
    pub login_attempt: LoginAttemptConfig,

    /// Captcha gate
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Token federation
    #[serde(default)]
    pub federation: FederationConfig,

    /// Authorization defaults
    #[serde(default)]
    pub authorization: AuthorizationConfig,

    /// Access control entries, in registration order
    #[serde(default)]
    pub acl: Vec<AclEntry>,

    /// Seed identities
    #[serde(default)]
    pub users: Vec<User>,

    /// Message overrides: locale, then message key, then text
    #[serde(default)]
    pub messages: HashMap<String, HashMap<String, String>>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    ///
    /// `${VAR}` references are replaced by the variable's value before parsing.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(yaml);
        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Default configuration with `TOKEN_WARDEN_*` overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::default().with_env_overrides()
    }

    /// Apply `TOKEN_WARDEN_*` environment variables on top of this configuration
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(ttl) = env_parse("TOKEN_TTL_SECS")? {
            self.token.ttl_secs = ttl;
        }
        if let Some(refresh) = env_parse("TOKEN_REFRESH_ON_ACCESS")? {
            self.token.refresh_on_access = refresh;
        }
        if let Some(rotate) = env_parse("TOKEN_ROTATE_ON_REFRESH")? {
            self.token.rotate_on_refresh = rotate;
        }

        if let Some(enabled) = env_parse("LOGIN_ATTEMPT_ENABLED")? {
            self.login_attempt.enabled = enabled;
        }
        if let Some(max) = env_parse("LOGIN_ATTEMPT_MAX_FAILURES")? {
            self.login_attempt.max_failures = max;
        }
        if let Some(lock) = env_parse("LOGIN_ATTEMPT_LOCK_SECS")? {
            self.login_attempt.lock_secs = lock;
        }

        if let Some(enabled) = env_parse("CAPTCHA_ENABLED")? {
            self.captcha.enabled = enabled;
        }

        if let Some(enabled) = env_parse("FEDERATION_ENABLED")? {
            self.federation.enabled = enabled;
        }
        if let Some(issuers) = env_var("FEDERATION_TRUSTED_ISSUERS") {
            self.federation.trusted_issuers = issuers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(policy) = env_var("AUTHORIZATION_DEFAULT_POLICY") {
            self.authorization.default_policy = match policy.to_ascii_lowercase().as_str() {
                "permit" => DefaultPolicy::Permit,
                "deny" => DefaultPolicy::Deny,
                other => {
                    return Err(ConfigError::InvalidValue(format!(
                        "{}AUTHORIZATION_DEFAULT_POLICY: {}",
                        ENV_PREFIX, other
                    )))
                }
            };
        }

        if let Some(level) = env_var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env_var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(self)
    }

    /// Check values that parse but make no sense
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.ttl_secs == 0 {
            return Err(ConfigError::InvalidValue("token.ttl_secs must be positive".into()));
        }
        if self.token.max_generation_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "token.max_generation_attempts must be at least 1".into(),
            ));
        }

        if self.login_attempt.enabled {
            if self.login_attempt.max_failures == 0 {
                return Err(ConfigError::InvalidValue(
                    "login_attempt.max_failures must be at least 1".into(),
                ));
            }
            if self.login_attempt.window_secs == 0 || self.login_attempt.lock_secs == 0 {
                return Err(ConfigError::InvalidValue(
                    "login_attempt.window_secs and lock_secs must be positive".into(),
                ));
            }
        }

        if self.captcha.enabled {
            if !(1..=32).contains(&self.captcha.answer_length) {
                return Err(ConfigError::InvalidValue(
                    "captcha.answer_length must be between 1 and 32".into(),
                ));
            }
            if self.captcha.ttl_secs == 0 {
                return Err(ConfigError::InvalidValue("captcha.ttl_secs must be positive".into()));
            }
        }

        for entry in &self.acl {
            if !entry.pattern.as_str().starts_with('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "acl pattern must start with '/': {}",
                    entry.pattern
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for user in &self.users {
            if user.username.is_empty() {
                return Err(ConfigError::MissingRequired("users[].username".into()));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(ConfigError::InvalidValue(format!("duplicate user: {}", user.username)));
            }
            if user.password_hash.is_empty() {
                return Err(ConfigError::MissingRequired(format!(
                    "users[{}].password_hash",
                    user.username
                )));
            }
            if PasswordHash::new(&user.password_hash).is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "users[{}].password_hash is not a PHC hash string",
                    user.username
                )));
            }
        }

        self.logging.validate()
    }

    /// Process-wide feature switches
    pub fn features(&self) -> Features {
        Features {
            login_attempt_enabled: self.login_attempt.enabled,
            captcha_enabled: self.captcha.enabled,
            federation_enabled: self.federation.enabled,
            default_policy: self.authorization.default_policy,
        }
    }

    /// Token manager options
    pub fn token_options(&self) -> TokenOptions {
        TokenOptions {
            ttl: Duration::from_secs(self.token.ttl_secs),
            rotate_on_refresh: self.token.rotate_on_refresh,
            revive_expired: self.token.revive_expired,
            max_generation_attempts: self.token.max_generation_attempts,
        }
    }

    /// Lockout policy
    pub fn lockout_config(&self) -> LockoutConfig {
        LockoutConfig {
            max_failures: self.login_attempt.max_failures,
            lock_duration: Duration::from_secs(self.login_attempt.lock_secs),
            window_duration: Duration::from_secs(self.login_attempt.window_secs),
        }
    }

    /// Captcha policy
    pub fn captcha_config(&self) -> crate::auth::CaptchaConfig {
        crate::auth::CaptchaConfig {
            ttl: Duration::from_secs(self.captcha.ttl_secs),
            answer_length: self.captcha.answer_length,
        }
    }
}

/// Token lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenConfig {
    /// Validity of a token after issue or refresh
    #[serde(default = "default_token_ttl")]
    pub ttl_secs: u64,

    /// Extend bearer tokens each time they authenticate
    #[serde(default)]
    pub refresh_on_access: bool,

    /// Replace the token string on refresh
    #[serde(default)]
    pub rotate_on_refresh: bool,

    /// Allow refreshing expired tokens
    #[serde(default)]
    pub revive_expired: bool,

    /// Attempts at drawing an unused token string
    #[serde(default = "default_max_generation_attempts")]
    pub max_generation_attempts: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_token_ttl(),
            refresh_on_access: false,
            rotate_on_refresh: false,
            revive_expired: false,
            max_generation_attempts: default_max_generation_attempts(),
        }
    }
}

fn default_token_ttl() -> u64 {
    1800 // 30 minutes
}

fn default_max_generation_attempts() -> u32 {
    5
}

/// Failed login tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginAttemptConfig {
    /// Whether lockout is active
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Failures within the window that lock the identity
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    /// Counting window
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Lock duration
    #[serde(default = "default_lock_secs")]
    pub lock_secs: u64,
}

impl Default for LoginAttemptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failures: default_max_failures(),
            window_secs: default_window_secs(),
            lock_secs: default_lock_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_failures() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    600 // 10 minutes
}

fn default_lock_secs() -> u64 {
    900 // 15 minutes
}

/// Captcha configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptchaConfig {
    /// Require a solved challenge before password login
    #[serde(default)]
    pub enabled: bool,

    /// Challenge lifetime
    #[serde(default = "default_captcha_ttl")]
    pub ttl_secs: u64,

    /// Digits in a challenge answer
    #[serde(default = "default_answer_length")]
    pub answer_length: usize,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_secs: default_captcha_ttl(),
            answer_length: default_answer_length(),
        }
    }
}

fn default_captcha_ttl() -> u64 {
    120
}

fn default_answer_length() -> usize {
    6
}

/// Federation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FederationConfig {
    /// Whether federation requests are served
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Issuers whose tokens are exchanged for local tokens
    #[serde(default)]
    pub trusted_issuers: Vec<String>,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trusted_issuers: Vec::new(),
        }
    }
}

/// Authorization configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthorizationConfig {
    /// Decision for resources no ACL entry matches
    #[serde(default)]
    pub default_policy: DefaultPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (`json` or `pretty`)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue(format!("logging.level: {}", self.level)));
        }
        if !matches!(self.format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidValue(format!("logging.format: {}", self.format)));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    /// Error parsing configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, name)).ok()
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    env_var(name)
        .map(|value| {
            value.trim().parse().map_err(|_| {
                ConfigError::InvalidValue(format!("{}{}: {}", ENV_PREFIX, name, value))
            })
        })
        .transpose()
}

/// Expand `${VAR_NAME}` references; unset variables are left as written
fn expand_env_vars(input: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([^}]+)\}") else {
        return input.to_string();
    };

    re.replace_all(input, |caps: &regex_lite::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::models::Effect;

    // Test 1: Parse complete configuration from YAML
    #[test]
    fn test_parse_complete_yaml_config() {
        let hash = hash_password("s3cret").unwrap();
        let yaml = format!(
            r#"
token:
  ttl_secs: 600
  refresh_on_access: true
  rotate_on_refresh: true
  max_generation_attempts: 3

login_attempt:
  enabled: true
  max_failures: 3
  window_secs: 60
  lock_secs: 120

captcha:
  enabled: true
  ttl_secs: 30
  answer_length: 4

federation:
  enabled: true
  trusted_issuers: ["partner.example"]

authorization:
  default_policy: permit

acl:
  - pattern: "/admin/*"
    effect: deny
    roles: [guest]
  - pattern: "/admin/*"
    effect: allow
    roles: [admin]
    actions: [GET, POST]
  - pattern: "/docs/*"
    effect: allow
    owner: true

users:
  - username: alice
    password_hash: "{hash}"
    roles: [admin]
  - username: bob
    password_hash: "{hash}"
    locked: true

messages:
  de:
    auth.account_locked: "Konto gesperrt."

logging:
  level: debug
  format: pretty
"#
        );

        let config = Config::from_yaml(&yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.token.ttl_secs, 600);
        assert!(config.token.refresh_on_access);
        assert!(config.token.rotate_on_refresh);
        assert!(!config.token.revive_expired);
        assert_eq!(config.token.max_generation_attempts, 3);

        assert_eq!(config.login_attempt.max_failures, 3);
        assert_eq!(config.login_attempt.window_secs, 60);
        assert_eq!(config.login_attempt.lock_secs, 120);

        assert!(config.captcha.enabled);
        assert_eq!(config.captcha.answer_length, 4);

        assert_eq!(config.federation.trusted_issuers, vec!["partner.example"]);
        assert_eq!(config.authorization.default_policy, DefaultPolicy::Permit);

        assert_eq!(config.acl.len(), 3);
        assert_eq!(config.acl[0].effect, Effect::Deny);
        assert!(config.acl[0].roles.contains("guest"));
        assert_eq!(config.acl[1].actions, vec!["GET", "POST"]);
        assert!(config.acl[2].owner);

        assert_eq!(config.users.len(), 2);
        assert!(config.users[0].has_role("admin"));
        assert!(config.users[1].locked);

        assert_eq!(config.messages["de"]["auth.account_locked"], "Konto gesperrt.");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }

    // Test 2: Default values are applied for missing fields
    #[test]
    fn test_default_values_applied() {
        let yaml = r#"
token:
  ttl_secs: 60
login_attempt:
  max_failures: 10
"#;

        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.token.ttl_secs, 60);
        assert_eq!(config.token.max_generation_attempts, 5);
        assert!(config.login_attempt.enabled);
        assert_eq!(config.login_attempt.max_failures, 10);
        assert_eq!(config.login_attempt.window_secs, 600);
        assert_eq!(config.login_attempt.lock_secs, 900);
        assert!(!config.captcha.enabled);
        assert!(config.federation.enabled);
        assert_eq!(config.authorization.default_policy, DefaultPolicy::Deny);
        assert_eq!(config.logging.format, "json");
    }

    // Test 3: Environment variable expansion
    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("TW_TEST_ISSUER", "issuer.example");

        let yaml = r#"
federation:
  trusted_issuers: ["${TW_TEST_ISSUER}", "${TW_TEST_UNSET_VAR}"]
"#;

        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(
            config.federation.trusted_issuers,
            vec!["issuer.example", "${TW_TEST_UNSET_VAR}"]
        );

        std::env::remove_var("TW_TEST_ISSUER");
    }

    // Test 4: from_env loads overrides from TOKEN_WARDEN_* variables
    #[test]
    fn test_from_env() {
        std::env::set_var("TOKEN_WARDEN_TOKEN_TTL_SECS", "90");
        std::env::set_var("TOKEN_WARDEN_LOGIN_ATTEMPT_MAX_FAILURES", "7");
        std::env::set_var("TOKEN_WARDEN_CAPTCHA_ENABLED", "true");
        std::env::set_var("TOKEN_WARDEN_FEDERATION_TRUSTED_ISSUERS", "a.example, b.example");
        std::env::set_var("TOKEN_WARDEN_AUTHORIZATION_DEFAULT_POLICY", "Permit");
        std::env::set_var("TOKEN_WARDEN_LOG_FORMAT", "pretty");

        let config = Config::from_env().unwrap();

        assert_eq!(config.token.ttl_secs, 90);
        assert_eq!(config.login_attempt.max_failures, 7);
        assert!(config.captcha.enabled);
        assert_eq!(config.federation.trusted_issuers, vec!["a.example", "b.example"]);
        assert_eq!(config.authorization.default_policy, DefaultPolicy::Permit);
        assert_eq!(config.logging.format, "pretty");

        std::env::remove_var("TOKEN_WARDEN_TOKEN_TTL_SECS");
        std::env::remove_var("TOKEN_WARDEN_LOGIN_ATTEMPT_MAX_FAILURES");
        std::env::remove_var("TOKEN_WARDEN_CAPTCHA_ENABLED");
        std::env::remove_var("TOKEN_WARDEN_FEDERATION_TRUSTED_ISSUERS");
        std::env::remove_var("TOKEN_WARDEN_AUTHORIZATION_DEFAULT_POLICY");
        std::env::remove_var("TOKEN_WARDEN_LOG_FORMAT");

        // malformed values are reported, not ignored
        std::env::set_var("TOKEN_WARDEN_LOGIN_ATTEMPT_LOCK_SECS", "soon");
        let result = Config::default().with_env_overrides();
        std::env::remove_var("TOKEN_WARDEN_LOGIN_ATTEMPT_LOCK_SECS");

        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    // Test 5: Load from file, and report unreadable files
    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "token:\n  ttl_secs: 42\nauthorization:\n  default_policy: permit").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.token.ttl_secs, 42);
        assert_eq!(config.authorization.default_policy, DefaultPolicy::Permit);

        let dir = tempfile::tempdir().unwrap();
        let missing = Config::from_file(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(ConfigError::FileRead(_))));
    }

    // Test 6: Parse error for invalid YAML
    #[test]
    fn test_parse_error_invalid_yaml() {
        let yaml = r#"
token:
  ttl_secs: "not_a_number"
"#;

        let result = Config::from_yaml(yaml);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    // Test 7: Empty YAML gives a valid default configuration
    #[test]
    fn test_empty_yaml_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        config.validate().unwrap();
    }

    // Test 8: Validation rejects nonsensical values
    #[test]
    fn test_validate_rejects() {
        let mut zero_ttl = Config::default();
        zero_ttl.token.ttl_secs = 0;
        assert!(matches!(zero_ttl.validate(), Err(ConfigError::InvalidValue(_))));

        let mut bad_pattern = Config::default();
        bad_pattern.acl.push(AclEntry::allow("admin/*"));
        assert!(matches!(bad_pattern.validate(), Err(ConfigError::InvalidValue(_))));

        let mut bad_hash = Config::default();
        bad_hash.users.push(User::new("alice", "plaintext"));
        assert!(matches!(bad_hash.validate(), Err(ConfigError::InvalidValue(_))));

        let mut no_hash = Config::default();
        no_hash.users.push(User::new("alice", ""));
        assert!(matches!(no_hash.validate(), Err(ConfigError::MissingRequired(_))));

        let mut bad_format = Config::default();
        bad_format.logging.format = "xml".to_string();
        assert!(matches!(bad_format.validate(), Err(ConfigError::InvalidValue(_))));
    }

    // Test 9: Duplicate users are rejected
    #[test]
    fn test_validate_duplicate_users() {
        let hash = hash_password("x").unwrap();
        let mut config = Config::default();
        config.users.push(User::new("alice", hash.clone()));
        config.users.push(User::new("alice", hash));

        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    // Test 10: Sections convert to engine options
    #[test]
    fn test_engine_options() {
        let mut config = Config::default();
        config.token.ttl_secs = 60;
        config.token.revive_expired = true;
        config.login_attempt.enabled = false;
        config.authorization.default_policy = DefaultPolicy::Permit;

        let options = config.token_options();
        assert_eq!(options.ttl, Duration::from_secs(60));
        assert!(options.revive_expired);

        let lockout = config.lockout_config();
        assert_eq!(lockout.lock_duration, Duration::from_secs(900));
        assert_eq!(lockout.window_duration, Duration::from_secs(600));

        let features = config.features();
        assert!(!features.login_attempt_enabled);
        assert!(features.federation_enabled);
        assert_eq!(features.default_policy, DefaultPolicy::Permit);

        assert_eq!(config.captcha_config().answer_length, 6);
    }
}
