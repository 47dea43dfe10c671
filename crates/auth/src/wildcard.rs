//! Shell-style wildcard matching of permission queries.
//!
//! The *query* is the pattern and the stored permission name is the subject:
//! `"report-*"` matches `"report-delete"` but not `"reports"`. Matching is
//! whole-string and case-sensitive.

use regex::Regex;

pub const WILDCARD: char = '*';

/// A compiled permission query.
#[derive(Debug, Clone)]
pub enum PermissionPattern {
    Exact(String),
    Wildcard { raw: String, regex: Regex },
}

impl PermissionPattern {
    pub fn new(query: &str) -> Self {
        if !query.contains(WILDCARD) {
            return Self::Exact(query.to_string());
        }

        let body = query
            .split(WILDCARD)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        match Regex::new(&format!("(?s)^{body}$")) {
            Ok(regex) => Self::Wildcard {
                raw: query.to_string(),
                regex,
            },
            // Escaped input always compiles; exact comparison is the safe reading otherwise.
            Err(_) => Self::Exact(query.to_string()),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(query) => query == name,
            Self::Wildcard { raw, regex } => raw == name || regex.is_match(name),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(query) => query,
            Self::Wildcard { raw, .. } => raw,
        }
    }
}

/// One-off convenience over [`PermissionPattern`].
pub fn matches(query: &str, name: &str) -> bool {
    PermissionPattern::new(query).matches(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_wildcard() {
        assert!(matches("report-*", "report-delete"));
        assert!(matches("report-*", "report-"));
        assert!(!matches("report-*", "reports"));
    }

    #[test]
    fn exact_without_wildcard() {
        assert!(matches("post-edit", "post-edit"));
        assert!(!matches("post-edit", "post-edit-own"));
        assert!(!matches("post", "post-edit"));
    }

    #[test]
    fn case_sensitive() {
        assert!(!matches("Post-*", "post-edit"));
        assert!(!matches("post-edit", "POST-EDIT"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(matches("users.read", "users.read"));
        assert!(!matches("users.read", "usersXread"));
        assert!(matches("a+b*", "a+b-anything"));
        assert!(!matches("a+b*", "aab-anything"));
    }

    #[test]
    fn infix_and_lone_wildcards() {
        assert!(matches("post-*-own", "post-edit-own"));
        assert!(!matches("post-*-own", "post-edit-all"));
        assert!(matches("*", "anything"));
        assert!(matches("*", ""));
    }

    #[test]
    fn keeps_raw_query() {
        assert_eq!(PermissionPattern::new("a-*").as_str(), "a-*");
        assert_eq!(PermissionPattern::new("a").as_str(), "a");
    }
}
