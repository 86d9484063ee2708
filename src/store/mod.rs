//! Storage provider interfaces
//!
//! Each engine reaches its backing store through one of these narrow traits.
//! They use `async_trait` for async methods and `mockall::automock` for testing.
//! The in-memory implementations in [`memory`] are the default backends.

pub mod memory;

pub use memory::{
    InMemoryCaptchaProvider, InMemoryIdentityProvider, InMemoryLoginAttemptProvider,
    InMemoryTokenProvider, UrlAclProvider,
};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{AclEntry, Challenge, LoginAttempt, Token, User};

/// Identity store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Load a user by username
    async fn load_user(&self, username: &str) -> Result<Option<User>, StoreError>;
}

/// Token store
///
/// `save` inserts or replaces the token stored under the same string.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Persist a token
    async fn save(&self, token: &Token) -> Result<(), StoreError>;

    /// Look a token up by its string
    async fn find_by_string(&self, token: &str) -> Result<Option<Token>, StoreError>;

    /// Remove a token; removing a missing token is not an error
    async fn delete(&self, token: &str) -> Result<(), StoreError>;
}

/// Login attempt store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginAttemptProvider: Send + Sync {
    /// Get the attempt record for an identity
    async fn get(&self, identity: &str) -> Result<Option<LoginAttempt>, StoreError>;

    /// Persist an attempt record, replacing the previous one
    async fn save(&self, attempt: &LoginAttempt) -> Result<(), StoreError>;

    /// Remove the record for an identity; removing a missing record is not an error
    async fn delete(&self, identity: &str) -> Result<(), StoreError>;
}

/// Access control list source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AclProvider: Send + Sync {
    /// Entries whose pattern matches the resource, most specific first
    ///
    /// Entries with equally specific patterns keep their registration order.
    async fn find_matching(&self, resource: &str) -> Result<Vec<AclEntry>, StoreError>;
}

/// Captcha challenge store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptchaProvider: Send + Sync {
    /// Persist a challenge
    async fn save(&self, challenge: &Challenge) -> Result<(), StoreError>;

    /// Remove and return a challenge
    async fn consume(&self, id: &str) -> Result<Option<Challenge>, StoreError>;
}
