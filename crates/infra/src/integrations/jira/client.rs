use async_trait::async_trait;
use issuesync_core::TargetTracker;
use issuesync_domain::{
    FieldDefinition, IssueProjection, IssueUpdate, JiraConfig, Result, SyncError, TargetComment,
    TargetIssue,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use super::types::{
    AssigneePayload, CommentPage, CommentPayload, CreatedIssue, FieldsPayload, SearchResponse,
    TransitionPayload, TransitionRef, WireComment, WireField, SEARCH_FIELDS,
};
use crate::errors::InfraError;
use crate::http::HttpClient;

const API_PREFIX: &str = "rest/api/2/";
const COMMENT_PAGE_SIZE: u64 = 100;

/// Ticket tracker client over the REST API v2
pub struct JiraClient {
    http_client: HttpClient,
    base_url: Url,
}

impl JiraClient {
    pub fn new(base_url: &str, http_client: HttpClient) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| SyncError::Config(format!("invalid JIRA base URL '{base_url}': {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http_client, base_url })
    }

    /// Build a client with basic auth from configuration
    pub fn from_config(config: &JiraConfig) -> Result<Self> {
        let http_client =
            HttpClient::builder().basic_auth(&config.username, &config.password).build()?;
        Self::new(&config.base_url, http_client)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(API_PREFIX)
            .and_then(|api| api.join(path))
            .map_err(|e| SyncError::Internal(format!("cannot build URL for {path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response =
            self.http_client.send_checked(self.http_client.request(Method::GET, url)).await?;
        Ok(response.json().await.map_err(InfraError::from)?)
    }

    /// Send a JSON body, failing on any non-success status
    async fn send_json<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<reqwest::Response> {
        self.http_client.send_checked(self.http_client.request(method, url).json(body)).await
    }
}

#[async_trait]
impl TargetTracker for JiraClient {
    async fn search_issues(&self, query: &str) -> Result<Vec<TargetIssue>> {
        let mut url = self.endpoint("search")?;
        url.query_pairs_mut().append_pair("jql", query).append_pair("fields", SEARCH_FIELDS);
        let found: SearchResponse = self.get_json(url).await?;
        debug!(jql = query, matches = found.issues.len(), "searched target issues");
        Ok(found.issues.into_iter().map(TargetIssue::from).collect())
    }

    async fn create_issue(&self, projection: &IssueProjection) -> Result<TargetIssue> {
        let url = self.endpoint("issue")?;
        let response =
            self.send_json(Method::POST, url, &FieldsPayload::from(projection)).await?;
        let created: CreatedIssue = response.json().await.map_err(InfraError::from)?;
        info!(project = %projection.project_key, target_issue = %created.key, "created target issue");
        Ok(TargetIssue { id: created.id, key: created.key, ..TargetIssue::default() })
    }

    async fn update_issue(&self, issue_key: &str, update: &IssueUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let url = self.endpoint(&format!("issue/{issue_key}"))?;
        self.send_json(Method::PUT, url, &FieldsPayload::from(update)).await?;
        Ok(())
    }

    async fn update_assignee(&self, issue_id: &str, assignee: Option<&str>) -> Result<()> {
        let url = self.endpoint(&format!("issue/{issue_id}/assignee"))?;
        self.send_json(Method::PUT, url, &AssigneePayload { name: assignee }).await?;
        Ok(())
    }

    async fn do_transition(&self, issue_id: &str, transition_id: &str) -> Result<()> {
        let url = self.endpoint(&format!("issue/{issue_id}/transitions"))?;
        let payload = TransitionPayload { transition: TransitionRef { id: transition_id } };
        self.send_json(Method::POST, url, &payload).await?;
        Ok(())
    }

    async fn list_comments(&self, issue_id: &str) -> Result<Vec<TargetComment>> {
        let mut comments = Vec::new();
        loop {
            let mut url = self.endpoint(&format!("issue/{issue_id}/comment"))?;
            url.query_pairs_mut()
                .append_pair("startAt", &comments.len().to_string())
                .append_pair("maxResults", &COMMENT_PAGE_SIZE.to_string());
            let page: CommentPage = self.get_json(url).await?;
            let fetched = u64::try_from(page.comments.len()).unwrap_or(u64::MAX);
            comments.extend(page.comments.into_iter().map(TargetComment::from));
            if fetched == 0 || page.start_at.saturating_add(fetched) >= page.total {
                return Ok(comments);
            }
        }
    }

    async fn add_comment(&self, issue_id: &str, body: &str) -> Result<TargetComment> {
        let url = self.endpoint(&format!("issue/{issue_id}/comment"))?;
        let response = self.send_json(Method::POST, url, &CommentPayload { body }).await?;
        let created: WireComment = response.json().await.map_err(InfraError::from)?;
        Ok(created.into())
    }

    async fn update_comment(&self, issue_id: &str, comment_id: &str, body: &str) -> Result<()> {
        let url = self.endpoint(&format!("issue/{issue_id}/comment/{comment_id}"))?;
        self.send_json(Method::PUT, url, &CommentPayload { body }).await?;
        Ok(())
    }

    async fn delete_comment(&self, issue_id: &str, comment_id: &str) -> Result<()> {
        let url = self.endpoint(&format!("issue/{issue_id}/comment/{comment_id}"))?;
        self.http_client.send_checked(self.http_client.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn list_fields(&self) -> Result<Vec<FieldDefinition>> {
        let fields: Vec<WireField> = self.get_json(self.endpoint("field")?).await?;
        Ok(fields.into_iter().map(FieldDefinition::from).collect())
    }
}
