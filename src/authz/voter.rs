//! Access voters
//!
//! A voter looks at one ACL entry and one request and votes the entry's effect
//! when the entry names the requesting principal.

use crate::models::{AccessRequest, AclEntry, Effect};

/// Vote of one voter on one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Grant,
    Deny,
    Abstain,
}

impl From<Effect> for Vote {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Allow => Vote::Grant,
            Effect::Deny => Vote::Deny,
        }
    }
}

/// Authorization logic for one kind of ACL subject
pub trait AccessVoter: Send + Sync {
    /// Voter name for logs
    fn name(&self) -> &str;

    /// Vote on an entry that matched the request's resource
    fn vote(&self, entry: &AclEntry, request: &AccessRequest) -> Vote;
}

/// Votes when the entry's roles intersect the principal's roles
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleVoter;

impl AccessVoter for RoleVoter {
    fn name(&self) -> &str {
        "role"
    }

    fn vote(&self, entry: &AclEntry, request: &AccessRequest) -> Vote {
        if entry.roles.iter().any(|role| request.principal.has_role(role)) {
            entry.effect.into()
        } else {
            Vote::Abstain
        }
    }
}

/// Votes when the entry names the principal, or covers resource owners and
/// the principal owns the resource
#[derive(Debug, Default, Clone, Copy)]
pub struct UserVoter;

impl AccessVoter for UserVoter {
    fn name(&self) -> &str {
        "user"
    }

    fn vote(&self, entry: &AclEntry, request: &AccessRequest) -> Vote {
        let username = &request.principal.username;
        let named = entry.users.contains(username);
        let owns = entry.owner && request.owner.as_deref() == Some(username.as_str());

        if named || owns {
            entry.effect.into()
        } else {
            Vote::Abstain
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn request(user: User) -> AccessRequest {
        AccessRequest::new(user, "/docs/1")
    }

    // Test 1: role voter votes the effect for matching roles
    #[test]
    fn test_role_voter() {
        let admin = User::new("alice", "").with_roles(["admin"]);
        let guest = User::new("bob", "").with_roles(["guest"]);
        let entry = AclEntry::deny("/docs/*").with_roles(["guest"]);

        assert_eq!(RoleVoter.vote(&entry, &request(guest)), Vote::Deny);
        assert_eq!(RoleVoter.vote(&entry, &request(admin)), Vote::Abstain);
    }

    // Test 2: role voter abstains on entries without roles
    #[test]
    fn test_role_voter_empty_roles() {
        let admin = User::new("alice", "").with_roles(["admin"]);
        let entry = AclEntry::allow("/docs/*").with_users(["alice"]);

        assert_eq!(RoleVoter.vote(&entry, &request(admin)), Vote::Abstain);
    }

    // Test 3: user voter matches named users
    #[test]
    fn test_user_voter_named() {
        let entry = AclEntry::allow("/docs/*").with_users(["alice"]);

        assert_eq!(UserVoter.vote(&entry, &request(User::new("alice", ""))), Vote::Grant);
        assert_eq!(UserVoter.vote(&entry, &request(User::new("bob", ""))), Vote::Abstain);
    }

    // Test 4: user voter matches resource owners
    #[test]
    fn test_user_voter_owner() {
        let entry = AclEntry::allow("/docs/*").with_owner(true);
        let alice = User::new("alice", "");

        let owned = AccessRequest::new(alice.clone(), "/docs/1").with_owner("alice");
        let foreign = AccessRequest::new(alice.clone(), "/docs/1").with_owner("bob");
        let unknown = AccessRequest::new(alice, "/docs/1");

        assert_eq!(UserVoter.vote(&entry, &owned), Vote::Grant);
        assert_eq!(UserVoter.vote(&entry, &foreign), Vote::Abstain);
        assert_eq!(UserVoter.vote(&entry, &unknown), Vote::Abstain);
    }
}
