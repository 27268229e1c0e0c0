//! The access filter: the single authorization entry point.

use std::collections::HashSet;

use tracing::debug;

use crate::error::AuthzResult;
use crate::registry::{ProviderRegistry, ProviderSnapshot};
use crate::types::{Actor, Permission, Repo, RepoUri};

/// Outcome of one resolution pass.
enum Resolution {
    /// The principal is an administrator; every input repo is visible.
    AcceptAll,
    /// URIs the principal may access for the requested permission.
    Accepted(HashSet<RepoUri>),
}

/// Enforcement mechanism for repository permissions.
///
/// Accepts a list of repositories and a permission and returns the
/// subsequence the current actor holds that permission on. Resolution
/// runs against a point-in-time snapshot of the [`ProviderRegistry`],
/// invoking providers strictly in configured order.
pub struct AccessFilter {
    registry: std::sync::Arc<ProviderRegistry>,
}

impl AccessFilter {
    /// Create a filter reading from `registry`.
    #[must_use]
    pub fn new(registry: std::sync::Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Filter `repos` down to those `actor` holds `perm` on.
    ///
    /// Internal actors bypass authorization entirely: a request that
    /// originates from the hosting service itself sees every
    /// repository. That bypass is deliberate, so correctness of
    /// [`Actor::is_internal`] matters here.
    ///
    /// The result preserves input order and returns the original
    /// `Repo` values; it never contains a repository absent from the
    /// input.
    ///
    /// # Errors
    ///
    /// Any identity or authorization provider failure aborts the whole
    /// call. There is no partial result on error.
    pub async fn filter(
        &self,
        actor: &Actor,
        repos: Vec<Repo>,
        perm: Permission,
    ) -> AuthzResult<Vec<Repo>> {
        if repos.is_empty() {
            return Ok(repos);
        }
        if actor.is_internal() {
            return Ok(repos);
        }

        let snapshot = self.registry.snapshot();
        match resolve(&snapshot, actor, &repos, perm).await? {
            Resolution::AcceptAll => Ok(repos),
            Resolution::Accepted(accepted) => Ok(repos
                .into_iter()
                .filter(|repo| accepted.contains(&repo.uri))
                .collect()),
        }
    }
}

/// Run the multi-provider resolution algorithm.
///
/// Ownership is first-claim-wins: the first authorization provider (in
/// configured order) that returns any entry for a URI is authoritative
/// for it, even if the entry denies, and later providers never see that
/// URI again. Silence is the only way a provider defers. Provider order
/// is therefore security-relevant: an early denial masks a later
/// provider's grant for the same URI.
async fn resolve(
    snapshot: &ProviderSnapshot,
    actor: &Actor,
    repos: &[Repo],
    perm: Permission,
) -> AuthzResult<Resolution> {
    let mut unresolved: HashSet<Repo> = repos.iter().cloned().collect();
    let mut accepted: HashSet<RepoUri> = HashSet::new();

    for identity_provider in snapshot.identity_providers() {
        if unresolved.is_empty() {
            break;
        }
        let (user, is_admin) = identity_provider.current_identity(actor).await?;
        if is_admin {
            debug!(user = %user, "administrator identity, accepting all repositories");
            return Ok(Resolution::AcceptAll);
        }
        for mapper in snapshot.identity_mappers() {
            if unresolved.is_empty() {
                break;
            }
            for provider in snapshot.authz_providers() {
                if unresolved.is_empty() {
                    break;
                }
                let authz_id = mapper.authz_id(&user, provider.as_ref());
                let answers = provider.repo_perms(&authz_id, &unresolved).await?;

                // Any entry is this provider's final verdict for that
                // URI: grant it or not, the repo leaves circulation.
                unresolved.retain(|repo| match answers.get(&repo.uri) {
                    Some(perms) => {
                        if perms.get(&perm).copied().unwrap_or(false) {
                            accepted.insert(repo.uri.clone());
                        }
                        false
                    },
                    None => true,
                });
            }
        }
    }

    if snapshot.default_allow() {
        accepted.extend(unresolved.into_iter().map(|repo| repo.uri));
    }
    Ok(Resolution::Accepted(accepted))
}
