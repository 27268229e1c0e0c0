//! Convenience re-exports for downstream crates.

pub use crate::error::{AuthzError, AuthzResult};
pub use crate::filter::AccessFilter;
pub use crate::provider::{AuthzProvider, IdentityMapper, IdentityProvider, UsernameMapper};
pub use crate::registry::{ProviderRegistry, ProviderSnapshot};
pub use crate::types::{
    Actor, AuthzId, ExternalRepoSpec, Permission, PermissionMap, Repo, RepoUri, UserId,
};
