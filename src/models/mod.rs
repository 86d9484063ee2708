//! Domain models for token-warden
//!
//! This module contains the core domain models used throughout the crate.

pub mod acl;
pub mod attempt;
pub mod captcha;
pub mod token;
pub mod user;

// Re-export commonly used types
pub use acl::{AccessRequest, AclEntry, Effect, UrlPattern};
pub use attempt::LoginAttempt;
pub use captcha::Challenge;
pub use token::Token;
pub use user::{Authentication, Credentials, User};
