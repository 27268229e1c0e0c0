//! Provider contracts the resolution engine composes against.
//!
//! An identity provider answers "who is asking". An authorization
//! provider answers "what can this identity access" for the
//! repositories it owns. An identity mapper converts between the two
//! vocabularies. Collaborators are injected as trait objects; there are
//! no global override hooks.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::AuthzResult;
use crate::types::{Actor, AuthzId, PermissionMap, Repo, RepoUri, UserId};

/// Source of truth for the current principal's canonical identity.
///
/// Implementations must be safe to call once per resolution. Typical
/// backing stores are the hosting service's user database or an SSO
/// session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the principal behind `actor`.
    ///
    /// Returns the canonical user ID and whether the principal is a
    /// site administrator. Administrators short-circuit resolution to
    /// accept-all.
    ///
    /// # Errors
    ///
    /// Any error aborts the enclosing resolution (fail-closed).
    async fn current_identity(&self, actor: &Actor) -> AuthzResult<(UserId, bool)>;
}

/// Source of truth for which repositories an identity may access,
/// scoped to the repositories this provider owns.
#[async_trait]
pub trait AuthzProvider: Send + Sync {
    /// Authoritative permissions answer for the subset of `repos` this
    /// provider has an opinion on.
    ///
    /// Absence of a URI in the returned map means "no opinion";
    /// presence, even with an all-false permission map, means this
    /// provider is authoritative and denies.
    ///
    /// # Errors
    ///
    /// Any error aborts the enclosing resolution (fail-closed).
    async fn repo_perms(
        &self,
        authz_id: &AuthzId,
        repos: &HashSet<Repo>,
    ) -> AuthzResult<HashMap<RepoUri, PermissionMap>>;

    /// Partition `repos` into (mine, others) by ownership.
    ///
    /// The two sets must be disjoint and their union must equal the
    /// input; backends rely on this to scope their own `repo_perms`
    /// computation.
    async fn repos(&self, repos: &HashSet<Repo>) -> (HashSet<Repo>, HashSet<Repo>);
}

/// Converts an identity-provider user ID into the ID a specific
/// authorization provider expects.
///
/// Implementations must be cheap and local: no network I/O. Return
/// [`AuthzId::none`] when no mapping applies to that provider.
pub trait IdentityMapper: Send + Sync {
    /// The authorization ID to use for `provider`, or the empty
    /// sentinel when no mapping applies.
    fn authz_id(&self, user: &UserId, provider: &dyn AuthzProvider) -> AuthzId;
}

/// The string-identity mapper.
///
/// Assumes the hosting service username equals the code-host username,
/// which holds when both sit behind the same SSO mechanism.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsernameMapper;

impl IdentityMapper for UsernameMapper {
    fn authz_id(&self, user: &UserId, _provider: &dyn AuthzProvider) -> AuthzId {
        AuthzId::new(user.as_str())
    }
}
