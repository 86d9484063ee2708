//! token-warden - Pluggable authentication and authorization core
//!
//! This crate decides, per request, who the requester is and what they may do:
//! a token manager, an authentication provider chain with lockout and captcha,
//! voter-based URL authorization and token federation. Storage sits behind
//! narrow provider traits with in-memory reference backends.

pub mod auth;
pub mod authz;
pub mod config;
pub mod context;
pub mod error;
pub mod features;
pub mod federation;
pub mod i18n;
pub mod logging;
pub mod models;
pub mod session;
pub mod store;

pub use context::SecurityContext;
pub use error::{AppError, AuthError, StoreError};
pub use features::{DefaultPolicy, Features};
