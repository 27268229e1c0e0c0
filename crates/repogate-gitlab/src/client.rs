//! Paginated enumeration client for the GitLab projects API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::codehost::normalize_base_url;
use crate::error::{GitLabError, GitLabResult};

/// One GitLab project as returned by the projects API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    /// Numeric project ID on the instance.
    pub id: i64,
    /// Namespace-qualified project path, e.g. `group/repo`.
    pub path_with_namespace: String,
}

/// One page of the remote enumeration.
///
/// `page_url` is either a path relative to the instance's `api/v4/`
/// root (first request) or the opaque absolute URL returned as the
/// previous page's next-page pointer. Enumeration stops when no pointer
/// is returned.
#[async_trait]
pub trait ProjectLister: Send + Sync {
    /// Fetch one page of projects plus the next-page pointer, if any.
    ///
    /// # Errors
    ///
    /// Transport failures and non-success responses are errors; they
    /// abort the enclosing enumeration.
    async fn list_projects(&self, page_url: &str) -> GitLabResult<(Vec<Project>, Option<String>)>;
}

/// HTTP client for one GitLab instance, authenticated with a token
/// privileged enough to impersonate users (`sudo`).
pub struct GitLabClient {
    /// Normalized base URL, with a trailing slash.
    base: String,
    token: String,
    http: reqwest::Client,
}

impl GitLabClient {
    /// Create a client for the instance at `base_url`.
    #[must_use]
    pub fn new(base_url: &Url, token: impl Into<String>) -> Self {
        let mut base = normalize_base_url(base_url).to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self {
            base,
            token: token.into(),
            http: reqwest::Client::new(),
        }
    }

    fn page_request_url(&self, page_url: &str) -> String {
        // Next-page pointers from the Link header are absolute.
        if page_url.starts_with("https://") || page_url.starts_with("http://") {
            page_url.to_string()
        } else {
            format!("{}api/v4/{page_url}", self.base)
        }
    }
}

#[async_trait]
impl ProjectLister for GitLabClient {
    async fn list_projects(&self, page_url: &str) -> GitLabResult<(Vec<Project>, Option<String>)> {
        let url = self.page_request_url(page_url);
        debug!(url = %url, "fetching GitLab project page");

        let response = self
            .http
            .get(&url)
            .header("private-token", &self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GitLabError::RequestFailed { status, body });
        }

        let next = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_next_link);

        let projects: Vec<Project> = response.json().await?;
        Ok((projects, next))
    }
}

/// Extract the `rel="next"` target from a Link header, if present.
fn parse_next_link(link: &str) -> Option<String> {
    for part in link.split(',') {
        let mut sections = part.split(';');
        let Some(target) = sections.next() else {
            continue;
        };
        if sections.any(|section| section.trim() == "rel=\"next\"") {
            let url = target.trim().trim_start_matches('<').trim_end_matches('>');
            return Some(url.to_string());
        }
    }
    None
}
