//! Token generation and credential hashing
//!
//! This module provides functions for generating opaque bearer tokens and for
//! hashing and verifying passwords.
//! Tokens use the `tw_` prefix followed by 32 bytes of random data encoded in URL-safe Base64.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use thiserror::Error;

/// Token prefix for token-warden tokens
pub const TOKEN_PREFIX: &str = "tw_";

/// Length of the random part of the token in bytes
const TOKEN_RANDOM_BYTES: usize = 32;

/// Length of the random part of identifiers in bytes
const ID_RANDOM_BYTES: usize = 16;

/// Generate a new bearer token string
///
/// The token format is: `tw_` + Base64-encoded 32 random bytes
///
/// # Example
///
/// ```
/// use token_warden::auth::token::generate_token;
///
/// let token = generate_token();
/// assert!(token.starts_with("tw_"));
/// ```
pub fn generate_token() -> String {
    let mut random_bytes = [0u8; TOKEN_RANDOM_BYTES];
    OsRng.fill_bytes(&mut random_bytes);

    format!("{}{}", TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(random_bytes))
}

/// Generate a random identifier (Base64-encoded 16 bytes)
pub fn generate_id() -> String {
    let mut id_bytes = [0u8; ID_RANDOM_BYTES];
    OsRng.fill_bytes(&mut id_bytes);
    URL_SAFE_NO_PAD.encode(id_bytes)
}

/// Generate a random string of decimal digits
pub fn generate_digits(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Check if a token has the correct format
///
/// Valid tokens start with `tw_` and have a base64-encoded body.
pub fn is_valid_token_format(token: &str) -> bool {
    let Some(body) = token.strip_prefix(TOKEN_PREFIX) else {
        return false;
    };

    if body.is_empty() {
        return false;
    }

    URL_SAFE_NO_PAD.decode(body).is_ok()
}

/// Hash a password using Argon2id
///
/// The hash includes a random salt and uses the default Argon2 parameters.
///
/// # Returns
///
/// The Argon2id hash string (PHC format)
///
/// # Example
///
/// ```
/// use token_warden::auth::token::hash_password;
///
/// let hash = hash_password("s3cret").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HashError::HashFailed(e.to_string()))
}

/// Verify a password against a stored hash
///
/// Returns `false` for malformed hashes.
///
/// ```
/// use token_warden::auth::token::{hash_password, verify_password};
///
/// let hash = hash_password("s3cret").unwrap();
/// assert!(verify_password("s3cret", &hash));
/// assert!(!verify_password("wrong", &hash));
/// ```
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Error type for password hashing
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HashError {
    /// Hashing failed
    #[error("Hash failed: {0}")]
    HashFailed(String),
}
