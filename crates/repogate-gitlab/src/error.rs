//! Error types for the GitLab backend.

use thiserror::Error;

/// Errors from the GitLab enumeration client and provider internals.
#[derive(Debug, Error)]
pub enum GitLabError {
    /// The ownership match pattern carries no recognized wildcard.
    #[error("invalid match pattern {pattern:?}: must start with \"*/\" or end with \"/*\"")]
    InvalidMatchPattern {
        /// The pattern string as configured.
        pattern: String,
    },

    /// The GitLab API answered with a non-success status.
    #[error("GitLab request failed with status {status}: {body}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Response body, for operator diagnostics.
        body: String,
    },

    /// The HTTP transport failed before a response was read.
    #[error("GitLab transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Result type for GitLab backend operations.
pub type GitLabResult<T> = Result<T, GitLabError>;
