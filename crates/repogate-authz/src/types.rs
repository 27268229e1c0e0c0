//! Core value types shared across providers and the filter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Canonical name/path of a repository on the hosting service.
///
/// This is the key every provider answer is keyed by, and the unit of
/// the accept/deny decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoUri(String);

impl RepoUri {
    /// Create a repository URI.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The URI as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepoUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepoUri {
    fn from(uri: &str) -> Self {
        Self(uri.to_string())
    }
}

impl From<String> for RepoUri {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

/// Identifies the external repository that a hosted repository mirrors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalRepoSpec {
    /// Repository ID in the external service's own vocabulary.
    pub id: String,
    /// Kind of external service (e.g. `"gitlab"`).
    pub service_type: String,
    /// Normalized base URL of the external service instance.
    pub service_id: String,
}

/// A repository as seen by the authorization engine.
///
/// Value semantics: two `Repo`s are equal iff all fields are equal, so
/// the same logical repository constructed by different call sites
/// collapses to one set/map entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repo {
    /// Canonical repository URI.
    pub uri: RepoUri,
    /// External-service identity, when known.
    pub external: Option<ExternalRepoSpec>,
}

impl Repo {
    /// Create a repository with no external-service metadata.
    pub fn new(uri: impl Into<RepoUri>) -> Self {
        Self {
            uri: uri.into(),
            external: None,
        }
    }

    /// Create a repository with external-service metadata attached.
    pub fn with_external(uri: impl Into<RepoUri>, external: ExternalRepoSpec) -> Self {
        Self {
            uri: uri.into(),
            external: Some(external),
        }
    }
}

/// A type of requested capability.
///
/// Answers are permission maps rather than booleans so that adding a
/// variant never breaks an existing provider answer.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read access to repository contents.
    Read,
}

/// Permission map for one repository: absent or `false` means denied.
pub type PermissionMap = HashMap<Permission, bool>;

/// The principal's canonical ID as supplied by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Create a user ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The principal's ID in the vocabulary of one authorization provider.
///
/// The empty value is a sentinel meaning "no mapping applies to this
/// provider"; backends treat it as having no opinion and skip remote
/// work for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthzId(String);

impl AuthzId {
    /// Create an authorization ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The no-mapping sentinel.
    #[must_use]
    pub fn none() -> Self {
        Self(String::new())
    }

    /// Whether this is the no-mapping sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuthzId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The caller behind one request.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    user: Option<String>,
    internal: bool,
}

impl Actor {
    /// A trusted, non-user-bound service-to-service caller.
    #[must_use]
    pub fn internal() -> Self {
        Self {
            user: None,
            internal: true,
        }
    }

    /// An authenticated end user.
    pub fn from_user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            internal: false,
        }
    }

    /// Whether this actor is an internal service principal.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// The authenticated username, if any.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_repo_value_equality() {
        let spec = ExternalRepoSpec {
            id: "42".to_string(),
            service_type: "gitlab".to_string(),
            service_id: "https://gitlab.mine/".to_string(),
        };
        let a = Repo::with_external("gitlab.mine/u0/r0", spec.clone());
        let b = Repo::with_external("gitlab.mine/u0/r0", spec);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        set.insert(Repo::new("gitlab.mine/u0/r0"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_authz_id_sentinel() {
        assert!(AuthzId::none().is_empty());
        assert!(!AuthzId::new("u0").is_empty());
    }

    #[test]
    fn test_actor_kinds() {
        let internal = Actor::internal();
        assert!(internal.is_internal());
        assert_eq!(internal.user(), None);

        let user = Actor::from_user("bl");
        assert!(!user.is_internal());
        assert_eq!(user.user(), Some("bl"));
    }
}
