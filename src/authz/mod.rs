//! Authorization
//!
//! Voter-based access decisions over URL-pattern ACL entries, aggregated with
//! deny-overrides.

pub mod manager;
pub mod provider;
pub mod voter;

pub use manager::{AuthorizationManager, Decision};
pub use provider::{AuthorizationProvider, UrlAuthorizationProvider, Verdict};
pub use voter::{AccessVoter, RoleVoter, UserVoter, Vote};
