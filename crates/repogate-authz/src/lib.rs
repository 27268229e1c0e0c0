//! Repogate Authz - Repository-access authorization engine.
//!
//! This crate provides:
//! - Value types identifying repositories and principals
//! - The identity/authorization provider contracts
//! - A swappable registry holding the active provider set
//! - The access filter that composes providers into one decision
//!
//! # Security Model
//!
//! The filter is the trust boundary between the hosting service and
//! external code-host permission systems. It fails closed: any provider
//! error aborts the whole call, and the default-allow policy applies
//! only to repositories no configured provider claimed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use repogate_authz::{
//!     AccessFilter, Actor, Permission, ProviderRegistry, ProviderSnapshot, Repo,
//! };
//!
//! # async fn demo() -> repogate_authz::AuthzResult<()> {
//! let registry = Arc::new(ProviderRegistry::new());
//! registry.replace(ProviderSnapshot::new(true, vec![], vec![], vec![]));
//!
//! let filter = AccessFilter::new(registry);
//! let repos = vec![Repo::new("gitlab.mine/u0/r0")];
//! let visible = filter
//!     .filter(&Actor::internal(), repos, Permission::Read)
//!     .await?;
//! assert_eq!(visible.len(), 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod filter;
mod provider;
mod registry;
mod types;

pub use error::{AuthzError, AuthzResult};
pub use filter::AccessFilter;
pub use provider::{AuthzProvider, IdentityMapper, IdentityProvider, UsernameMapper};
pub use registry::{ProviderRegistry, ProviderSnapshot};
pub use types::{
    Actor, AuthzId, ExternalRepoSpec, Permission, PermissionMap, Repo, RepoUri, UserId,
};
