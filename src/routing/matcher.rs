//! Path prefix matching.
//!
//! # Design Decisions
//! - Matching is case-sensitive, as URI paths are
//! - A prefix only matches on a segment boundary: `/orders` matches
//!   `/orders` and `/orders/7`, never `/ordersx`
//! - No regex; matching is a single linear scan

/// Matches request paths against a configured prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Trailing slashes are dropped, so `/orders/` and `/orders` are the same prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        Self {
            prefix: if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() },
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return path.starts_with('/');
        }
        match path.strip_prefix(&self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}
