//! Canonical identity of one GitLab instance.

use repogate_authz::ExternalRepoSpec;
use url::Url;

/// `service_type` value for GitLab projects in an
/// [`ExternalRepoSpec`].
pub const SERVICE_TYPE: &str = "gitlab";

/// Normalize a base URL into a stable service identifier: lowercased
/// host, no trailing path slashes. Two operator spellings of the same
/// instance compare equal after normalization.
#[must_use]
pub fn normalize_base_url(base: &Url) -> Url {
    let mut url = base.clone();
    if let Some(host) = url.host_str().map(str::to_ascii_lowercase) {
        // set_host only fails for cannot-be-a-base URLs; HTTP base
        // URLs always have a host.
        let _ = url.set_host(Some(&host));
    }
    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);
    url
}

/// Identity of one GitLab instance, used to classify repositories by
/// their external-service metadata when no match pattern is configured.
#[derive(Debug, Clone)]
pub struct CodeHost {
    service_id: String,
}

impl CodeHost {
    /// Create the host identity for `base_url`.
    #[must_use]
    pub fn new(base_url: &Url) -> Self {
        Self {
            service_id: normalize_base_url(base_url).to_string(),
        }
    }

    /// The normalized service identifier.
    #[must_use]
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Whether `spec` refers to a project on this instance.
    #[must_use]
    pub fn is_host_of(&self, spec: &ExternalRepoSpec) -> bool {
        spec.service_type == SERVICE_TYPE && spec.service_id == self.service_id
    }
}
