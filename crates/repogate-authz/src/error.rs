//! Error types for the authorization engine.

use thiserror::Error;

/// Errors surfaced by the resolution engine.
///
/// There is no partial-success mode: any of these aborts the whole
/// `filter` call.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// An identity provider could not resolve the current principal.
    #[error("identity resolution failed: {0}")]
    IdentityResolution(String),

    /// An authorization provider failed to answer a permissions query.
    #[error("permission query failed: {0}")]
    PermissionQuery(String),
}

/// Result type for authorization operations.
pub type AuthzResult<T> = Result<T, AuthzError>;
