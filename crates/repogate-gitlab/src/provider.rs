//! The GitLab authorization provider.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use repogate_authz::{
    AuthzError, AuthzId, AuthzProvider, AuthzResult, Permission, PermissionMap, Repo, RepoUri,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use url::Url;

use crate::cache::{AclCache, MemoryAclCache};
use crate::client::{GitLabClient, ProjectLister};
use crate::codehost::CodeHost;
use crate::error::GitLabResult;
use crate::matcher::MatchPattern;

/// Template applied when no repository-path-pattern is configured.
const DEFAULT_REPO_PATH_PATTERN: &str = "{host}/{pathWithNamespace}";

/// Page size requested from the projects API.
const PER_PAGE: &str = "100";

/// Page-count interval for flagging pathological accounts.
const PAGE_WARN_INTERVAL: u64 = 100;

/// Serialized cache entry: the URIs accessible to one authorization
/// ID. Round-trips through the byte-oriented [`AclCache`].
#[derive(Debug, Serialize, Deserialize)]
struct CachedAccess {
    repos: HashSet<RepoUri>,
}

/// Authorization provider backed by one GitLab instance.
///
/// Ownership: if a match pattern is configured, classification tests
/// the repository URI against it and nothing else; otherwise
/// repositories are classified by their external-service metadata.
///
/// Permissions: the identity's accessible projects are enumerated once
/// per TTL window (full pagination, impersonating the identity) and
/// every owned repository gets an explicit entry, a grant or a
/// recorded denial.
pub struct GitLabProvider {
    lister: Arc<dyn ProjectLister>,
    code_host: CodeHost,
    host: String,
    repo_path_pattern: String,
    match_pattern: String,
    cache: Box<dyn AclCache>,
}

impl GitLabProvider {
    /// Create a provider with the real HTTP client and an in-process
    /// TTL cache.
    #[must_use]
    pub fn new(
        base_url: &Url,
        token: &str,
        repo_path_pattern: impl Into<String>,
        match_pattern: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self::with_parts(
            Arc::new(GitLabClient::new(base_url, token)),
            base_url,
            repo_path_pattern,
            match_pattern,
            Box::new(MemoryAclCache::new(ttl)),
        )
    }

    /// Create a provider from explicit collaborators. This is the seam
    /// tests use to substitute the enumeration transport and the
    /// cache.
    pub fn with_parts(
        lister: Arc<dyn ProjectLister>,
        base_url: &Url,
        repo_path_pattern: impl Into<String>,
        match_pattern: impl Into<String>,
        cache: Box<dyn AclCache>,
    ) -> Self {
        Self {
            lister,
            code_host: CodeHost::new(base_url),
            host: base_url.host_str().unwrap_or_default().to_string(),
            repo_path_pattern: repo_path_pattern.into(),
            match_pattern: match_pattern.into(),
            cache,
        }
    }

    /// Decode the cached access list for `authz_id`, treating expired
    /// or undecodable entries as misses.
    fn cached_access_list(&self, authz_id: &AuthzId) -> Option<HashSet<RepoUri>> {
        let bytes = self.cache.get(authz_id.as_str())?;
        match serde_json::from_slice::<CachedAccess>(&bytes) {
            Ok(entry) => Some(entry.repos),
            Err(err) => {
                warn!(authz_id = %authz_id, error = %err, "undecodable ACL cache entry, treating as a miss");
                None
            },
        }
    }

    /// Enumerate every repository URI accessible to `authz_id`,
    /// following next-page pointers until the remote reports no more.
    async fn fetch_user_access_list(&self, authz_id: &AuthzId) -> GitLabResult<HashSet<RepoUri>> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("sudo", authz_id.as_str())
            .append_pair("per_page", PER_PAGE)
            .finish();
        let mut page_url = format!("projects?{query}");
        let mut pages: u64 = 0;

        let mut accessible = HashSet::new();
        loop {
            pages += 1;
            if pages >= PAGE_WARN_INTERVAL && pages % PAGE_WARN_INTERVAL == 0 {
                warn!(pages, authz_id = %authz_id, "excessively many GitLab pages for one access list");
            }

            let (projects, next) = self.lister.list_projects(&page_url).await?;
            for project in projects {
                accessible.insert(build_repo_uri(
                    &self.repo_path_pattern,
                    &self.host,
                    &project.path_with_namespace,
                ));
            }
            match next {
                Some(next_url) => page_url = next_url,
                None => break,
            }
        }
        Ok(accessible)
    }
}

#[async_trait]
impl AuthzProvider for GitLabProvider {
    async fn repo_perms(
        &self,
        authz_id: &AuthzId,
        repos: &HashSet<Repo>,
    ) -> AuthzResult<HashMap<RepoUri, PermissionMap>> {
        if authz_id.is_empty() {
            // No identity mapping applies to this provider; defer on
            // everything without touching the remote.
            return Ok(HashMap::new());
        }

        let (mine, _) = self.repos(repos).await;

        let accessible = match self.cached_access_list(authz_id) {
            Some(set) => set,
            None => {
                let set = self
                    .fetch_user_access_list(authz_id)
                    .await
                    .map_err(|err| AuthzError::PermissionQuery(err.to_string()))?;
                // Written only after the whole enumeration succeeded;
                // a failed walk leaves no partial entry behind.
                let bytes = serde_json::to_vec(&CachedAccess { repos: set.clone() })
                    .map_err(|err| AuthzError::PermissionQuery(err.to_string()))?;
                self.cache.set(authz_id.as_str(), bytes);
                set
            },
        };

        let mut perms = HashMap::new();
        for repo in mine {
            let mut map = PermissionMap::new();
            if accessible.contains(&repo.uri) {
                map.insert(Permission::Read, true);
            }
            // Owned repos always get an entry; silence would hand the
            // decision to the next provider.
            perms.insert(repo.uri, map);
        }
        Ok(perms)
    }

    async fn repos(&self, repos: &HashSet<Repo>) -> (HashSet<Repo>, HashSet<Repo>) {
        if !self.match_pattern.is_empty() {
            return match MatchPattern::parse(&self.match_pattern) {
                Ok(rule) => repos
                    .iter()
                    .cloned()
                    .partition(|repo| rule.matches(repo.uri.as_str())),
                Err(err) => {
                    // Fail safe: a bad pattern claims nothing.
                    error!(pattern = %self.match_pattern, error = %err, "invalid ownership match pattern");
                    (HashSet::new(), repos.clone())
                },
            };
        }

        repos.iter().cloned().partition(|repo| {
            repo.external
                .as_ref()
                .is_some_and(|spec| self.code_host.is_host_of(spec))
        })
    }
}

/// Map a remote project path to a canonical repository URI via the
/// configured template.
fn build_repo_uri(pattern: &str, host: &str, path_with_namespace: &str) -> RepoUri {
    let pattern = if pattern.is_empty() {
        DEFAULT_REPO_PATH_PATTERN
    } else {
        pattern
    };
    RepoUri::from(
        pattern
            .replace("{host}", host)
            .replace("{pathWithNamespace}", path_with_namespace),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use repogate_authz::ExternalRepoSpec;

    use super::*;
    use crate::client::Project;

    /// In-memory transport serving fixed per-identity ACLs in pages of
    /// `per_page`, counting calls so tests can assert cache behavior.
    struct MockLister {
        acls: HashMap<String, Vec<String>>,
        per_page: usize,
        calls: AtomicUsize,
    }

    impl MockLister {
        fn new(acls: &[(&str, &[&str])], per_page: usize) -> Arc<Self> {
            Arc::new(Self {
                acls: acls
                    .iter()
                    .map(|(user, paths)| {
                        (
                            (*user).to_string(),
                            paths.iter().map(|p| (*p).to_string()).collect(),
                        )
                    })
                    .collect(),
                per_page,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProjectLister for MockLister {
        async fn list_projects(
            &self,
            page_url: &str,
        ) -> GitLabResult<(Vec<Project>, Option<String>)> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let query = page_url.split_once('?').map_or("", |(_, q)| q);
            let param = |name: &str| {
                url::form_urlencoded::parse(query.as_bytes())
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| value.into_owned())
            };
            let sudo = param("sudo").unwrap_or_default();
            let page: usize = param("page").and_then(|p| p.parse().ok()).unwrap_or(1);

            let paths = self.acls.get(&sudo).cloned().unwrap_or_default();
            let start = (page - 1) * self.per_page;
            let projects: Vec<Project> = paths
                .iter()
                .skip(start)
                .take(self.per_page)
                .enumerate()
                .map(|(offset, path)| Project {
                    id: i64::try_from(start + offset).unwrap(),
                    path_with_namespace: path.clone(),
                })
                .collect();
            let next = (start + self.per_page < paths.len()).then(|| {
                format!(
                    "projects?sudo={sudo}&per_page={}&page={}",
                    self.per_page,
                    page + 1
                )
            });
            Ok((projects, next))
        }
    }

    fn base_url() -> Url {
        Url::parse("https://gitlab.mine").unwrap()
    }

    fn provider(lister: Arc<MockLister>, match_pattern: &str) -> GitLabProvider {
        GitLabProvider::with_parts(
            lister,
            &base_url(),
            "",
            match_pattern,
            Box::new(MemoryAclCache::new(Duration::from_secs(3600))),
        )
    }

    fn bl_acls() -> Arc<MockLister> {
        MockLister::new(
            &[
                (
                    "bl",
                    &["bl/repo-1", "bl/repo-2", "org/repo-1", "org/repo-2"],
                ),
                ("kl", &["kl/repo-1"]),
            ],
            100,
        )
    }

    fn repo_set(uris: &[&str]) -> HashSet<Repo> {
        uris.iter().map(|uri| Repo::new(*uri)).collect()
    }

    fn external_repo(uri: &str) -> Repo {
        Repo::with_external(
            uri,
            ExternalRepoSpec {
                id: "1".to_string(),
                service_type: "gitlab".to_string(),
                service_id: "https://gitlab.mine/".to_string(),
            },
        )
    }

    fn read_granted(perms: &HashMap<RepoUri, PermissionMap>, uri: &str) -> Option<bool> {
        perms
            .get(&RepoUri::from(uri))
            .map(|map| map.get(&Permission::Read).copied().unwrap_or(false))
    }

    #[tokio::test]
    async fn test_repo_perms_with_match_pattern() {
        let provider = provider(bl_acls(), "gitlab.mine/*");
        let mut repos = repo_set(&[
            "gitlab.mine/bl/repo-1",
            "gitlab.mine/kl/repo-1",
            "gitlab.mine/org/repo-1",
        ]);
        // Pattern overrides external-service metadata: this repo's URI
        // does not match, so the provider stays silent on it.
        repos.insert(external_repo("a"));

        let perms = provider.repo_perms(&AuthzId::new("bl"), &repos).await.unwrap();
        assert_eq!(perms.len(), 3);
        assert_eq!(read_granted(&perms, "gitlab.mine/bl/repo-1"), Some(true));
        assert_eq!(read_granted(&perms, "gitlab.mine/org/repo-1"), Some(true));
        // Owned but inaccessible: an explicit recorded denial.
        assert_eq!(read_granted(&perms, "gitlab.mine/kl/repo-1"), Some(false));
        assert_eq!(read_granted(&perms, "a"), None);
    }

    #[tokio::test]
    async fn test_repo_perms_without_match_pattern_uses_external_spec() {
        let provider = provider(bl_acls(), "");
        let mut repos = repo_set(&["gitlab.mine/bl/repo-1"]);
        repos.insert(external_repo("gitlab.mine/kl/repo-1"));

        let perms = provider.repo_perms(&AuthzId::new("bl"), &repos).await.unwrap();
        // Only the repo carrying this host's external spec is owned.
        assert_eq!(perms.len(), 1);
        assert_eq!(read_granted(&perms, "gitlab.mine/kl/repo-1"), Some(false));
        assert_eq!(read_granted(&perms, "gitlab.mine/bl/repo-1"), None);
    }

    #[tokio::test]
    async fn test_invalid_match_pattern_claims_nothing() {
        let lister = bl_acls();
        let provider = provider(Arc::clone(&lister), "gitlab.mine");
        let repos = repo_set(&["gitlab.mine/bl/repo-1"]);

        let (mine, others) = provider.repos(&repos).await;
        assert!(mine.is_empty());
        assert_eq!(others, repos);

        let perms = provider.repo_perms(&AuthzId::new("bl"), &repos).await.unwrap();
        assert!(perms.is_empty());
    }

    #[tokio::test]
    async fn test_partition_is_disjoint_and_exhaustive() {
        let provider = provider(bl_acls(), "gitlab.mine/*");
        let repos = repo_set(&["gitlab.mine/bl/repo-1", "otherHost/r0", "gitlab.mine/x"]);

        let (mine, others) = provider.repos(&repos).await;
        assert!(mine.is_disjoint(&others));
        let union: HashSet<Repo> = mine.union(&others).cloned().collect();
        assert_eq!(union, repos);
    }

    #[tokio::test]
    async fn test_cache_avoids_second_enumeration() {
        let lister = bl_acls();
        let provider = provider(Arc::clone(&lister), "gitlab.mine/*");
        let repos = repo_set(&["gitlab.mine/bl/repo-1"]);

        let first = provider.repo_perms(&AuthzId::new("bl"), &repos).await.unwrap();
        assert_eq!(lister.calls(), 1);
        let second = provider.repo_perms(&AuthzId::new("bl"), &repos).await.unwrap();
        assert_eq!(lister.calls(), 1, "second call within TTL must hit the cache");
        assert_eq!(first, second);

        // A different identity misses independently.
        provider.repo_perms(&AuthzId::new("kl"), &repos).await.unwrap();
        assert_eq!(lister.calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_cache_reenumerates() {
        let lister = bl_acls();
        let provider = GitLabProvider::with_parts(
            Arc::clone(&lister) as Arc<dyn ProjectLister>,
            &base_url(),
            "",
            "gitlab.mine/*",
            Box::new(MemoryAclCache::new(Duration::ZERO)),
        );
        let repos = repo_set(&["gitlab.mine/bl/repo-1"]);

        provider.repo_perms(&AuthzId::new("bl"), &repos).await.unwrap();
        provider.repo_perms(&AuthzId::new("bl"), &repos).await.unwrap();
        assert_eq!(lister.calls(), 2);
    }

    #[tokio::test]
    async fn test_undecodable_cache_entry_is_refetched() {
        let lister = bl_acls();
        let cache = MemoryAclCache::new(Duration::from_secs(3600));
        cache.set("bl", b"not json".to_vec());
        let provider = GitLabProvider::with_parts(
            Arc::clone(&lister) as Arc<dyn ProjectLister>,
            &base_url(),
            "",
            "gitlab.mine/*",
            Box::new(cache),
        );
        let repos = repo_set(&["gitlab.mine/bl/repo-1"]);

        let perms = provider.repo_perms(&AuthzId::new("bl"), &repos).await.unwrap();
        assert_eq!(lister.calls(), 1);
        assert_eq!(read_granted(&perms, "gitlab.mine/bl/repo-1"), Some(true));

        // The refetch repaired the entry.
        provider.repo_perms(&AuthzId::new("bl"), &repos).await.unwrap();
        assert_eq!(lister.calls(), 1);
    }

    #[tokio::test]
    async fn test_pagination_walks_every_page() {
        let lister = MockLister::new(
            &[(
                "bl",
                &[
                    "bl/repo-1", "bl/repo-2", "bl/repo-3", "org/repo-1", "org/repo-2",
                    "org/repo-3", "bl/a",
                ],
            )],
            1,
        );
        let provider = provider(Arc::clone(&lister), "gitlab.mine/*");
        let repos = repo_set(&[
            "gitlab.mine/bl/repo-1",
            "gitlab.mine/bl/repo-3",
            "gitlab.mine/bl/a",
            "gitlab.mine/org/repo-2",
        ]);

        let perms = provider.repo_perms(&AuthzId::new("bl"), &repos).await.unwrap();
        assert_eq!(lister.calls(), 7);
        for uri in [
            "gitlab.mine/bl/repo-1",
            "gitlab.mine/bl/repo-3",
            "gitlab.mine/bl/a",
            "gitlab.mine/org/repo-2",
        ] {
            assert_eq!(read_granted(&perms, uri), Some(true), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_empty_authz_id_short_circuits() {
        let lister = bl_acls();
        let provider = provider(Arc::clone(&lister), "gitlab.mine/*");
        let repos = repo_set(&["gitlab.mine/bl/repo-1"]);

        let perms = provider.repo_perms(&AuthzId::none(), &repos).await.unwrap();
        assert!(perms.is_empty());
        assert_eq!(lister.calls(), 0);
    }

    #[test]
    fn test_build_repo_uri_templates() {
        assert_eq!(
            build_repo_uri("", "gitlab.mine", "bl/repo-1"),
            RepoUri::from("gitlab.mine/bl/repo-1")
        );
        assert_eq!(
            build_repo_uri("git/{host}/{pathWithNamespace}", "gitlab.mine", "bl/repo-1"),
            RepoUri::from("git/gitlab.mine/bl/repo-1")
        );
    }
}
