//! Repogate GitLab - Authorization provider backed by a GitLab instance.
//!
//! This crate provides:
//! - A paginated enumeration client for the GitLab projects API
//! - The ownership match-pattern matcher
//! - A TTL cache for per-identity access lists
//! - The [`GitLabProvider`] implementation of
//!   [`AuthzProvider`](repogate_authz::AuthzProvider)
//!
//! The provider answers "which of these repositories can this identity
//! read" by enumerating the identity's accessible projects once per TTL
//! window and recording an explicit grant or denial for every
//! repository it owns.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod cache;
mod client;
mod codehost;
mod error;
mod matcher;
mod provider;

pub use cache::{AclCache, MemoryAclCache};
pub use client::{GitLabClient, Project, ProjectLister};
pub use codehost::{normalize_base_url, CodeHost, SERVICE_TYPE};
pub use error::{GitLabError, GitLabResult};
pub use matcher::MatchPattern;
pub use provider::GitLabProvider;
