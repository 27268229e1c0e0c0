//! Assembly of the provider set from connection descriptors.

use std::sync::Arc;
use std::time::Duration;

use repogate_authz::{
    AuthzProvider, IdentityMapper, IdentityProvider, ProviderSnapshot, UsernameMapper,
};
use repogate_gitlab::GitLabProvider;
use tracing::error;
use url::Url;

use crate::types::PermissionsConfig;

/// TTL applied when a descriptor's TTL string cannot be parsed.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Constructor arguments for one GitLab provider, handed to the
/// provider factory per surviving connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLabProviderParams {
    /// Parsed base URL of the instance.
    pub base_url: Url,
    /// Impersonation-capable access token.
    pub token: String,
    /// Repository-path-pattern template.
    pub repo_path_pattern: String,
    /// Ownership match-pattern string.
    pub match_pattern: String,
    /// ACL cache TTL.
    pub ttl: Duration,
}

/// The provider set derived from one validation pass over the
/// descriptors, plus everything operators need to see about it.
pub struct ProviderConfig {
    /// Whether repositories claimed by no provider are allowed. Forced
    /// off when any serious problem was found (fail closed).
    pub default_allow: bool,
    /// Identity providers, as passed through by the caller.
    pub identity_providers: Vec<Arc<dyn IdentityProvider>>,
    /// One authorization provider per surviving connection, in
    /// descriptor order.
    pub authz_providers: Vec<Arc<dyn AuthzProvider>>,
    /// Identity mappers; currently always the username mapper.
    pub identity_mappers: Vec<Arc<dyn IdentityMapper>>,
    /// Problems that forced default-allow off.
    pub serious_problems: Vec<String>,
    /// Problems that were recovered from and only need operator
    /// attention.
    pub warnings: Vec<String>,
}

impl ProviderConfig {
    /// Build the registry snapshot corresponding to this provider set.
    #[must_use]
    pub fn snapshot(&self) -> ProviderSnapshot {
        ProviderSnapshot::new(
            self.default_allow,
            self.identity_providers.clone(),
            self.authz_providers.clone(),
            self.identity_mappers.clone(),
        )
    }
}

/// Derive the provider set from `cfg` with the real GitLab provider
/// constructor.
#[must_use]
pub fn providers_from_config(
    cfg: &PermissionsConfig,
    identity_providers: Vec<Arc<dyn IdentityProvider>>,
) -> ProviderConfig {
    providers_from_config_with(cfg, identity_providers, |params| {
        Arc::new(GitLabProvider::new(
            &params.base_url,
            &params.token,
            params.repo_path_pattern,
            params.match_pattern,
            params.ttl,
        ))
    })
}

/// Like [`providers_from_config`], with an injected provider factory.
/// Tests substitute a recording factory here instead of patching a
/// global constructor.
pub fn providers_from_config_with<F>(
    cfg: &PermissionsConfig,
    identity_providers: Vec<Arc<dyn IdentityProvider>>,
    factory: F,
) -> ProviderConfig
where
    F: Fn(GitLabProviderParams) -> Arc<dyn AuthzProvider>,
{
    let mut serious_problems = Vec::new();
    let mut warnings = Vec::new();
    let mut authz_providers: Vec<Arc<dyn AuthzProvider>> = Vec::new();

    // The username mapper assumes hosting-service and code-host
    // usernames coincide; warn when the sign-in mechanism does not
    // guarantee that.
    if !cfg.external_auth_only {
        for conn in cfg.gitlab.iter().filter(|c| !c.permissions_ignore) {
            warnings.push(format!(
                "native authentication is enabled and GitLab connection {:?} enforces permissions; \
                 hosting-service usernames may not match code-host usernames",
                conn.url
            ));
        }
    }

    for conn in &cfg.gitlab {
        if conn.permissions_ignore {
            continue;
        }

        let base_url = match Url::parse(&conn.url) {
            Ok(url) => url,
            Err(err) => {
                serious_problems.push(format!(
                    "could not parse URL for GitLab instance {:?}: {err}",
                    conn.url
                ));
                // No provider without a usable URL.
                continue;
            },
        };

        let matcher = &conn.permissions_matcher;
        if !matcher.starts_with("*/") && !matcher.ends_with("/*") {
            serious_problems.push(format!(
                "GitLab connection {:?} should specify a permissions matcher starting with \"*/\" or ending with \"/*\"",
                conn.url
            ));
        }
        let inner = matcher.strip_prefix("*/").unwrap_or(matcher);
        let inner = inner.strip_suffix("/*").unwrap_or(inner);
        if inner.contains('*') {
            serious_problems.push(format!(
                "GitLab connection {:?} permissions matcher includes an interior wildcard \"*\", which is interpreted literally; only the prefix \"*/\" or the suffix \"/*\" patterns are supported",
                conn.url
            ));
        }

        let ttl = match humantime::parse_duration(&conn.permissions_ttl) {
            Ok(ttl) => ttl,
            Err(_) => {
                warnings.push(format!(
                    "could not parse time duration {:?}, falling back to 24 hours",
                    conn.permissions_ttl
                ));
                DEFAULT_CACHE_TTL
            },
        };

        authz_providers.push(factory(GitLabProviderParams {
            base_url,
            token: conn.token.clone(),
            repo_path_pattern: conn.repository_path_pattern.clone(),
            match_pattern: conn.permissions_matcher.clone(),
            ttl,
        }));
    }

    let default_allow = serious_problems.is_empty();
    if !default_allow {
        error!(
            problems = serious_problems.len(),
            "repository permissions configuration is invalid; restricting access to repositories by default"
        );
    }

    ProviderConfig {
        default_allow,
        identity_providers,
        authz_providers,
        identity_mappers: vec![Arc::new(UsernameMapper)],
        serious_problems,
        warnings,
    }
}

/// All validation problems for `cfg`, serious problems first. For
/// surfacing in an operator-facing configuration check.
#[must_use]
pub fn validate_config(cfg: &PermissionsConfig) -> Vec<String> {
    let derived = providers_from_config(cfg, Vec::new());
    let mut problems = derived.serious_problems;
    problems.extend(derived.warnings);
    problems
}
