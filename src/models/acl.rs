//! Access control models
//!
//! This module defines URL patterns, ACL entries and the per-request
//! authorization input.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::User;

/// One segment of a URL pattern
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Case-sensitive literal segment
    Literal(String),
    /// `*`: one segment, or one or more when last in the pattern
    Wildcard,
}

/// URL pattern made of `/`-separated segments
///
/// Literal segments match case-sensitively. `*` matches exactly one segment,
/// except in last position where it matches one or more remaining segments.
///
/// ```
/// use token_warden::models::UrlPattern;
///
/// let pattern = UrlPattern::new("/admin/*");
/// assert!(pattern.matches("/admin/users"));
/// assert!(pattern.matches("/admin/users/42"));
/// assert!(!pattern.matches("/admin"));
/// assert!(!pattern.matches("/Admin/users"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct UrlPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl UrlPattern {
    /// Parse a pattern
    pub fn new(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let segments = split_path(&raw)
            .map(|s| {
                if s == "*" {
                    Segment::Wildcard
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self { raw, segments }
    }

    /// Pattern as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check whether a request path matches the pattern
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_path(path).collect();
        let last = self.segments.len().saturating_sub(1);

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return false;
                    }
                }
                Segment::Wildcard if i == last => return parts.len() > i,
                Segment::Wildcard => {
                    if i >= parts.len() {
                        return false;
                    }
                }
            }
        }

        parts.len() == self.segments.len()
    }

    /// Specificity key: literal segments first, then total segments
    pub fn specificity(&self) -> (usize, usize) {
        let literals = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        (literals, self.segments.len())
    }

    /// Order two patterns from most to least specific
    pub fn cmp_specificity(&self, other: &Self) -> Ordering {
        other.specificity().cmp(&self.specificity())
    }
}

impl From<String> for UrlPattern {
    fn from(value: String) -> Self {
        UrlPattern::new(value)
    }
}

impl From<UrlPattern> for String {
    fn from(value: UrlPattern) -> Self {
        value.raw
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split a path into non-empty segments, ignoring any query string
fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('?')
        .next()
        .unwrap_or_default()
        .split('/')
        .filter(|s| !s.is_empty())
}

/// Effect voted by an ACL entry when it applies to the principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Grant access
    Allow,
    /// Deny access
    Deny,
}

/// Access control entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    /// Resource pattern
    pub pattern: UrlPattern,

    /// Actions the entry applies to (empty means all)
    #[serde(default)]
    pub actions: Vec<String>,

    /// Effect of the entry
    pub effect: Effect,

    /// Roles the entry applies to
    #[serde(default)]
    pub roles: BTreeSet<String>,

    /// Usernames the entry applies to
    #[serde(default)]
    pub users: BTreeSet<String>,

    /// Whether the entry applies to the owner of the resource
    #[serde(default)]
    pub owner: bool,
}

impl AclEntry {
    /// Create an entry with the given effect and no subjects
    pub fn new(pattern: impl Into<String>, effect: Effect) -> Self {
        Self {
            pattern: UrlPattern::new(pattern),
            actions: Vec::new(),
            effect,
            roles: BTreeSet::new(),
            users: BTreeSet::new(),
            owner: false,
        }
    }

    /// Create an allow entry
    pub fn allow(pattern: impl Into<String>) -> Self {
        Self::new(pattern, Effect::Allow)
    }

    /// Create a deny entry
    pub fn deny(pattern: impl Into<String>) -> Self {
        Self::new(pattern, Effect::Deny)
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

    /// Set users
    pub fn with_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users = users.into_iter().map(Into::into).collect();
        self
    }

    /// Apply the entry to resource owners
    pub fn with_owner(mut self, owner: bool) -> Self {
        self.owner = owner;
        self
    }

    /// Restrict the entry to actions
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether the entry covers a resource and action
    pub fn applies_to(&self, resource: &str, action: Option<&str>) -> bool {
        if !self.pattern.matches(resource) {
            return false;
        }

        match action {
            _ if self.actions.is_empty() => true,
            Some(action) => self.actions.iter().any(|a| a.eq_ignore_ascii_case(action)),
            None => false,
        }
    }
}

/// Authorization input for a single decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    /// Requesting principal
    pub principal: User,

    /// Resource path or operation id
    pub resource: String,

    /// Action performed on the resource (e.g. an HTTP method)
    pub action: Option<String>,

    /// Owner of the resource, when known
    pub owner: Option<String>,
}

impl AccessRequest {
    /// Create a request for a resource
    pub fn new(principal: User, resource: impl Into<String>) -> Self {
        Self {
            principal,
            resource: resource.into(),
            action: None,
            owner: None,
        }
    }

    /// Set the action
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Set the resource owner
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: Literal patterns match exactly
    #[test]
    fn test_literal_pattern() {
        let pattern = UrlPattern::new("/api/users");

        assert!(pattern.matches("/api/users"));
        assert!(pattern.matches("/api/users/"));
        assert!(!pattern.matches("/api/users/1"));
        assert!(!pattern.matches("/api"));
        assert!(!pattern.matches("/API/users"));
    }

    // Test 2: Inner wildcard matches exactly one segment
    #[test]
    fn test_inner_wildcard() {
        let pattern = UrlPattern::new("/api/*/profile");

        assert!(pattern.matches("/api/alice/profile"));
        assert!(!pattern.matches("/api/profile"));
        assert!(!pattern.matches("/api/a/b/profile"));
    }

    // Test 3: Trailing wildcard matches the rest of the path
    #[test]
    fn test_trailing_wildcard() {
        let pattern = UrlPattern::new("/admin/*");

        assert!(pattern.matches("/admin/x"));
        assert!(pattern.matches("/admin/x/y"));
        assert!(!pattern.matches("/admin"));
        assert!(!pattern.matches("/administrator/x"));
    }

    // Test 4: Query strings are ignored
    #[test]
    fn test_query_string_ignored() {
        assert!(UrlPattern::new("/search").matches("/search?q=rust"));
    }

    // Test 5: Root pattern only matches root
    #[test]
    fn test_root_pattern() {
        let pattern = UrlPattern::new("/");
        assert!(pattern.matches("/"));
        assert!(!pattern.matches("/x"));
    }

    // Test 6: Specificity prefers literal segments
    #[test]
    fn test_specificity_order() {
        let mut patterns = [
            UrlPattern::new("/*"),
            UrlPattern::new("/admin/users"),
            UrlPattern::new("/admin/*"),
            UrlPattern::new("/admin/*/edit"),
        ];
        patterns.sort_by(|a, b| a.cmp_specificity(b));

        let ordered: Vec<&str> = patterns.iter().map(|p| p.as_str()).collect();
        assert_eq!(
            ordered,
            vec!["/admin/*/edit", "/admin/users", "/admin/*", "/*"]
        );
    }

    // Test 7: Entry action filtering
    #[test]
    fn test_entry_actions() {
        let entry = AclEntry::allow("/docs/*").with_actions(["GET"]);

        assert!(entry.applies_to("/docs/a", Some("get")));
        assert!(!entry.applies_to("/docs/a", Some("DELETE")));
        assert!(!entry.applies_to("/docs/a", None));
        assert!(AclEntry::allow("/docs/*").applies_to("/docs/a", None));
    }

    // Test 8: Patterns deserialize from plain strings
    #[test]
    fn test_entry_deserialize() {
        let entry: AclEntry = serde_yaml::from_str(
            "pattern: /admin/*\neffect: deny\nroles: [guest]\n",
        )
        .unwrap();

        assert_eq!(entry.pattern.as_str(), "/admin/*");
        assert_eq!(entry.effect, Effect::Deny);
        assert!(entry.roles.contains("guest"));
        assert!(entry.actions.is_empty());
    }
}
