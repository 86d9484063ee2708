//! Authentication
//!
//! This module provides:
//! - Token lifecycle (issue, lookup, refresh, revoke)
//! - The authentication provider chain
//! - Login attempt tracking and lockout
//! - Captcha challenges

pub mod captcha;
pub mod chain;
pub mod lockout;
pub mod manager;
pub mod providers;
pub mod token;
pub mod token_manager;

pub use captcha::{CaptchaConfig, CaptchaManager};
pub use chain::{ChainFold, Outcome};
pub use lockout::{LockoutConfig, LoginAttemptManager};
pub use manager::AuthenticationManager;
pub use providers::{
    AuthenticationProvider, TokenAuthenticationProvider, UsernamePasswordAuthenticationProvider,
};
pub use token::{
    generate_token, hash_password, is_valid_token_format, verify_password, HashError, TOKEN_PREFIX,
};
pub use token_manager::{TokenManager, TokenOptions};
