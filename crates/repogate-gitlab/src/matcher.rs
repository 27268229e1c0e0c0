//! Ownership match-pattern parsing and matching.

use crate::error::{GitLabError, GitLabResult};

/// Match rule parsed from an operator-configured pattern string.
///
/// The pattern decides ownership purely from the repository URI string,
/// overriding any external-service metadata:
///
/// - `x/*` matches URIs starting with `x/`
/// - `*/x` matches URIs ending in `/x`
/// - `*/x/*` matches URIs containing `/x/`
///
/// A pattern with neither wildcard is a parse error; callers must treat
/// it as matching nothing, so a bad pattern can never over-claim
/// ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPattern {
    /// URI must start with the given string.
    Prefix(String),
    /// URI must end with the given string.
    Suffix(String),
    /// URI must contain the given string.
    Substring(String),
}

impl MatchPattern {
    /// Parse a pattern string.
    ///
    /// # Errors
    ///
    /// Returns [`GitLabError::InvalidMatchPattern`] when the pattern
    /// neither starts with `*/` nor ends with `/*`.
    pub fn parse(pattern: &str) -> GitLabResult<Self> {
        let start_glob = pattern.starts_with("*/");
        let end_glob = pattern.ends_with("/*");
        let inner = pattern.strip_suffix("/*").unwrap_or(pattern);
        let inner = inner.strip_prefix("*/").unwrap_or(inner);

        match (start_glob, end_glob) {
            (true, true) => Ok(Self::Substring(format!("/{inner}/"))),
            (true, false) => Ok(Self::Suffix(format!("/{inner}"))),
            (false, true) => Ok(Self::Prefix(format!("{inner}/"))),
            (false, false) => Err(GitLabError::InvalidMatchPattern {
                pattern: pattern.to_string(),
            }),
        }
    }

    /// Test the full repository URI against this rule.
    #[must_use]
    pub fn matches(&self, uri: &str) -> bool {
        match self {
            Self::Prefix(prefix) => uri.starts_with(prefix),
            Self::Suffix(suffix) => uri.ends_with(suffix),
            Self::Substring(needle) => uri.contains(needle),
        }
    }
}
