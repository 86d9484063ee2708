//! Process-wide feature switches
//!
//! Built once from configuration and shared by `Arc`; never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Decision applied when no ACL entry matches a resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultPolicy {
    /// Allow unmatched resources
    Permit,
    /// Deny unmatched resources
    #[default]
    Deny,
}

/// Optional behaviors enabled for this process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Features {
    /// Track failed logins and lock identities
    pub login_attempt_enabled: bool,

    /// Require a captcha answer before password login
    pub captcha_enabled: bool,

    /// Accept federation requests
    pub federation_enabled: bool,

    /// Policy for resources without ACL entries
    pub default_policy: DefaultPolicy,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            login_attempt_enabled: true,
            captcha_enabled: false,
            federation_enabled: true,
            default_policy: DefaultPolicy::Deny,
        }
    }
}
