//! Connection descriptor types.
//!
//! Schema parsing and human-facing validation UI live upstream; these
//! are the already-parsed values this crate consumes.

use serde::Deserialize;

/// Descriptor for one GitLab backend connection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GitLabConnection {
    /// Base URL of the GitLab instance.
    pub url: String,
    /// Access token privileged enough to impersonate users.
    pub token: String,
    /// Template mapping remote project paths to repository URIs;
    /// empty means `{host}/{pathWithNamespace}`.
    pub repository_path_pattern: String,
    /// Skip permission enforcement for this connection entirely.
    pub permissions_ignore: bool,
    /// Ownership match-pattern string (`x/*`, `*/x` or `*/x/*`).
    pub permissions_matcher: String,
    /// Cache TTL as a duration string (e.g. `"24h"`); unparseable
    /// values fall back to 24 hours with a warning.
    pub permissions_ttl: String,
}

/// Everything the provider assembly needs to know about the site
/// configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PermissionsConfig {
    /// Whether sign-in happens exclusively through an external auth
    /// mechanism shared with the code hosts. When false, hosting
    /// service usernames may not match code-host usernames, which
    /// undermines the username-identity mapping.
    pub external_auth_only: bool,
    /// Configured GitLab connections, in provider resolution order.
    pub gitlab: Vec<GitLabConnection>,
}
