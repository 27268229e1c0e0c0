//! Repogate Config - Provider assembly from connection descriptors.
//!
//! This crate consumes already-parsed backend connection descriptors
//! and produces the provider set the
//! [`ProviderRegistry`](repogate_authz::ProviderRegistry) is loaded
//! with, plus the validation problems partitioned into serious
//! problems and warnings.
//!
//! Serious problems force the default-allow policy off: a
//! configuration that cannot be interpreted safely must not leak
//! private repositories.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod providers;
mod types;

pub use providers::{
    providers_from_config, providers_from_config_with, validate_config, GitLabProviderParams,
    ProviderConfig, DEFAULT_CACHE_TTL,
};
pub use types::{GitLabConnection, PermissionsConfig};
