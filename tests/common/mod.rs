//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use token_warden::auth::{hash_password, TokenManager, TokenOptions};
use token_warden::config::Config;
use token_warden::models::User;
use token_warden::store::InMemoryTokenProvider;
use token_warden::SecurityContext;

/// Password of every seeded test user
pub const PASSWORD: &str = "correct horse battery staple";

/// Argon2 hash of [`PASSWORD`], computed once per test binary
pub fn password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).expect("Failed to hash test password"))
}

/// Configuration with alice (admin), bob (guest) and carol (locked), plus the
/// given YAML sections appended
pub fn create_test_config(extra_yaml: &str) -> Config {
    let yaml = format!(
        r#"
users:
  - username: alice
    password_hash: "{hash}"
    roles: [admin]
  - username: bob
    password_hash: "{hash}"
    roles: [guest]
  - username: carol
    password_hash: "{hash}"
    locked: true
{extra_yaml}
"#,
        hash = password_hash(),
    );
    Config::from_yaml(&yaml).expect("Failed to parse test config")
}

/// Security context built from [`create_test_config`]
pub fn create_test_context(extra_yaml: &str) -> SecurityContext {
    SecurityContext::from_config(&create_test_config(extra_yaml))
        .expect("Failed to build security context")
}

/// Token manager over a fresh in-memory store
pub fn create_test_token_manager(options: TokenOptions) -> (Arc<TokenManager>, Arc<InMemoryTokenProvider>) {
    let store = Arc::new(InMemoryTokenProvider::new());
    let manager = Arc::new(TokenManager::new(store.clone(), options));
    (manager, store)
}

/// Token options with a short TTL
pub fn short_lived(ttl: Duration) -> TokenOptions {
    TokenOptions {
        ttl,
        ..Default::default()
    }
}

/// Bare user without roles
pub fn user(name: &str) -> User {
    User::new(name, password_hash())
}
