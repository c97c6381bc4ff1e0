//! Field projector
//!
//! Maps source issues and comments onto target field sets. Projection never
//! fails: missing optional data degrades to an empty list or an unset field,
//! and a failed markdown conversion falls back to the raw text.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use issuesync_domain::constants::{
    DISPLAY_TIME_FORMAT, MAX_BODY_CHARS, SOURCE_LABEL, TRUNCATION_NOTICE,
};
use issuesync_domain::{
    CustomFieldKey, FieldIds, IssueProjection, IssueUpdate, RepositorySyncConfig, SourceComment,
    SourceIssue, SourceUser,
};
use serde_json::Value;
use tracing::warn;

use super::context::SyncMappings;
use super::ports::MarkdownConverter;

/// Cut `text` to the body limit, appending the truncation notice when cut.
/// Length is counted in characters so no code point is split.
pub fn shrink(text: &str) -> String {
    match text.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_NOTICE}", &text[..cut]),
        None => text.to_string(),
    }
}

fn user_reference(user: &SourceUser) -> String {
    let mut reference = format!("[{}|{}]", user.login, user.html_url);
    if let Some(name) = user.name.as_deref().filter(|n| !n.is_empty()) {
        let _ = write!(reference, " ({name})");
    }
    reference
}

/// Builds target field sets and comment bodies from source data
pub struct Projector {
    converter: Arc<dyn MarkdownConverter>,
    timezone: Tz,
    field_ids: FieldIds,
}

impl Projector {
    pub fn new(converter: Arc<dyn MarkdownConverter>, timezone: Tz, field_ids: FieldIds) -> Self {
        Self { converter, timezone, field_ids }
    }

    /// Timestamp as shown in attribution lines
    pub fn display_time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.timezone).format(DISPLAY_TIME_FORMAT).to_string()
    }

    /// Convert markup and apply the length limit
    pub async fn convert(&self, raw: &str) -> String {
        match self.converter.convert(raw).await {
            Ok(converted) => shrink(&converted),
            Err(err) => {
                warn!(error = %err, "markdown conversion failed, using raw body");
                shrink(raw)
            }
        }
    }

    /// Issue description: converted body followed by the attribution footer
    pub async fn format_body(&self, issue: &SourceIssue) -> String {
        let body = self.convert(issue.body_text()).await;
        format!(
            "{body}\n\n----\n\nCreate issue [(#{})|{}] from GitHub user {} at {}",
            issue.number,
            issue.html_url,
            user_reference(&issue.user),
            self.display_time(issue.created_at),
        )
    }

    /// Comment body: attribution header (with the correlation token) first
    pub async fn format_comment(&self, comment: &SourceComment) -> String {
        let body = self.convert(&comment.body).await;
        format!(
            "Comment [(ID {})|{}] from GitHub user {} at {}\n\n----\n\n{body}\n",
            comment.id,
            comment.html_url,
            user_reference(&comment.user),
            self.display_time(comment.created_at),
        )
    }

    /// Full field set for a target issue that does not exist yet
    pub async fn project_new_issue(
        &self,
        issue: &SourceIssue,
        repo: &RepositorySyncConfig,
        mappings: &SyncMappings,
    ) -> IssueProjection {
        let project_key = repo.jira_project.clone();

        let assignee = issue.assignee.as_ref().and_then(|user| {
            let mapped = mappings.target_user(&user.login).map(str::to_string);
            if mapped.is_none() {
                warn!(login = %user.login, issue_url = %issue.html_url, "GitHub user login not found in assignee map");
            }
            mapped
        });

        let mut custom_fields = std::collections::BTreeMap::new();
        if let Ok(field) = self.field_ids.field_id(CustomFieldKey::GithubId) {
            custom_fields.insert(field, Value::from(issue.id));
        }
        if repo.carry_source_url {
            if let Ok(field) = self.field_ids.field_id(CustomFieldKey::GithubUrl) {
                custom_fields.insert(field, Value::from(issue.html_url.clone()));
            }
        }

        IssueProjection {
            issue_type: repo.jira_issuetype.clone(),
            summary: issue.title.clone(),
            description: self.format_body(issue).await,
            components: repo.jira_components.clone(),
            fix_versions: mappings.fix_versions.get(&project_key).cloned().unwrap_or_default(),
            affects_versions: mappings
                .affects_versions
                .get(&project_key)
                .cloned()
                .unwrap_or_default(),
            labels: vec![SOURCE_LABEL.to_string()],
            assignee,
            custom_fields,
            project_key,
        }
    }

    /// Title and description only; identity fields are never recomputed
    pub async fn project_updated_issue(&self, issue: &SourceIssue) -> IssueUpdate {
        IssueUpdate {
            summary: Some(issue.title.clone()),
            description: Some(self.format_body(issue).await),
            ..IssueUpdate::default()
        }
    }
}
