//! Convenience re-exports for downstream crates.

pub use crate::cache::{AclCache, MemoryAclCache};
pub use crate::client::{GitLabClient, Project, ProjectLister};
pub use crate::codehost::CodeHost;
pub use crate::error::{GitLabError, GitLabResult};
pub use crate::matcher::MatchPattern;
pub use crate::provider::GitLabProvider;
