//! Principal and credential models

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::Token;

/// Authenticated principal as loaded from the identity store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique username
    pub username: String,

    /// Argon2id PHC hash of the password
    #[serde(default, skip_serializing)]
    pub password_hash: String,

    /// Role names granted to the user
    #[serde(default)]
    pub roles: BTreeSet<String>,

    /// Administratively locked users never authenticate
    #[serde(default)]
    pub locked: bool,
}

impl User {
    /// Create an unlocked user without roles
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            roles: BTreeSet::new(),
            locked: false,
        }
    }

    /// Set roles
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the administrative lock flag
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Check if the user holds a role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Credentials presented for authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Username and plaintext password
    Password {
        /// Claimed identity
        username: String,
        /// Plaintext secret
        password: String,
    },

    /// Previously issued bearer token
    Bearer(String),
}

impl Credentials {
    /// Username/password credentials
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Bearer token credentials
    pub fn bearer(token: impl Into<String>) -> Self {
        Credentials::Bearer(token.into())
    }
}

/// Successful authentication: the principal and the token bound to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authentication {
    /// Authenticated principal
    pub user: User,

    /// Token proving the authentication
    pub token: Token,
}
