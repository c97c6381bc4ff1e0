use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use issuesync_core::SourceTracker;
use issuesync_domain::constants::SOURCE_PAGE_SIZE;
use issuesync_domain::{GithubConfig, Result, SourceComment, SourceIssue, SyncError};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LINK};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::errors::InfraError;
use crate::http::HttpClient;

static NEXT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).expect("NEXT_LINK should compile - this is a bug")
});

/// URL of the next page from a `Link` header, if any
pub fn next_page(link_header: &str) -> Option<String> {
    link_header
        .split(',')
        .find_map(|part| NEXT_LINK.captures(part).map(|caps| caps[1].to_string()))
}

/// Code forge client over the REST API v3
pub struct GithubClient {
    http_client: HttpClient,
    base_url: Url,
}

impl GithubClient {
    pub fn new(base_url: &str, http_client: HttpClient) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| SyncError::Config(format!("invalid GitHub base URL '{base_url}': {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http_client, base_url })
    }

    /// Build a client from configuration; credentials are optional.
    pub fn from_config(config: &GithubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        let http_client = HttpClient::builder()
            .default_headers(headers)
            .basic_auth(&config.username, &config.password)
            .build()?;
        Self::new(&config.base_url, http_client)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| SyncError::Internal(format!("cannot build URL for {path}: {e}")))
    }

    /// GET every page starting at `first`
    async fn collect_pages<T: DeserializeOwned>(&self, first: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first.to_string());
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let response =
                self.http_client.send_checked(self.http_client.request(Method::GET, &url)).await?;
            next = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(next_page);
            let page: Vec<T> = response.json().await.map_err(InfraError::from)?;
            pages += 1;
            debug!(url = %url, count = page.len(), "fetched page");
            items.extend(page);
        }

        debug!(pages, total = items.len(), "pagination finished");
        Ok(items)
    }
}

fn since_param(since: DateTime<Utc>) -> String {
    since.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl SourceTracker for GithubClient {
    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourceIssue>> {
        let mut url = self.endpoint(&format!("repos/{owner}/{repo}/issues"))?;
        url.query_pairs_mut()
            .append_pair("state", "all")
            .append_pair("since", &since_param(since))
            .append_pair("sort", "created")
            .append_pair("direction", "asc")
            .append_pair("per_page", &SOURCE_PAGE_SIZE.to_string());

        let listed: Vec<SourceIssue> = self.collect_pages(url).await?;
        let total = listed.len();
        let issues: Vec<SourceIssue> =
            listed.into_iter().filter(|issue| !issue.is_pull_request()).collect();
        info!(owner, repo, total, issues = issues.len(), "listed source issues");
        Ok(issues)
    }

    async fn list_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourceComment>> {
        let mut url = self.endpoint(&format!("repos/{owner}/{repo}/issues/{number}/comments"))?;
        url.query_pairs_mut()
            .append_pair("since", &since_param(since))
            .append_pair("per_page", &SOURCE_PAGE_SIZE.to_string());
        self.collect_pages(url).await
    }
}
