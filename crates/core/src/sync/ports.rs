//! Port interfaces for sync operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use issuesync_domain::{
    FieldDefinition, IssueProjection, IssueUpdate, Result, SourceComment, SourceIssue,
    TargetComment, TargetIssue,
};

/// Read access to the code forge
#[async_trait]
pub trait SourceTracker: Send + Sync {
    /// List every issue of a repository updated since `since`, oldest first.
    /// Pull requests are excluded.
    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourceIssue>>;

    /// List the comments of one issue updated since `since`
    async fn list_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourceComment>>;
}

/// Read/write access to the ticket tracker
#[async_trait]
pub trait TargetTracker: Send + Sync {
    /// Run a structured query and return every matching issue
    async fn search_issues(&self, query: &str) -> Result<Vec<TargetIssue>>;

    /// Create an issue; the returned value carries at least id and key
    async fn create_issue(&self, projection: &IssueProjection) -> Result<TargetIssue>;

    /// Apply a partial update to an issue identified by key
    async fn update_issue(&self, issue_key: &str, update: &IssueUpdate) -> Result<()>;

    /// Set or clear (`None`) the assignee
    async fn update_assignee(&self, issue_id: &str, assignee: Option<&str>) -> Result<()>;

    /// Apply one workflow transition
    async fn do_transition(&self, issue_id: &str, transition_id: &str) -> Result<()>;

    /// List every comment of an issue, following pagination
    async fn list_comments(&self, issue_id: &str) -> Result<Vec<TargetComment>>;

    /// Add a comment and return it with its tracker id
    async fn add_comment(&self, issue_id: &str, body: &str) -> Result<TargetComment>;

    /// Replace the body of an existing comment
    async fn update_comment(&self, issue_id: &str, comment_id: &str, body: &str) -> Result<()>;

    /// Remove a comment
    async fn delete_comment(&self, issue_id: &str, comment_id: &str) -> Result<()>;

    /// List field definitions, used once at startup to resolve custom fields
    async fn list_fields(&self) -> Result<Vec<FieldDefinition>>;
}

/// Text transform from the forge's markdown dialect to the tracker's markup
#[async_trait]
pub trait MarkdownConverter: Send + Sync {
    /// Convert `text`; callers fall back to the raw text on error
    async fn convert(&self, text: &str) -> Result<String>;
}

/// Persistence for the last completed reconciliation pass
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Last written watermark; `None` when absent or unreadable
    async fn read(&self) -> Option<DateTime<Utc>>;

    /// Persist `at` as the new watermark
    async fn write(&self, at: DateTime<Utc>) -> Result<()>;
}
