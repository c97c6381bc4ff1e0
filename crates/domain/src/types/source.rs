//! Source (code forge) issue model
//!
//! Field names follow the forge's REST and webhook JSON so payloads decode
//! straight into these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUser {
    pub login: String,
    #[serde(default)]
    pub html_url: String,
    /// Display name; only present on some payloads
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLabel {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceIssue {
    /// Immutable numeric id; the correlation key on the target side
    pub id: u64,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub state: IssueState,
    pub user: SourceUser,
    #[serde(default)]
    pub assignee: Option<SourceUser>,
    #[serde(default)]
    pub labels: Vec<SourceLabel>,
    /// Number of comments on the issue
    #[serde(default)]
    pub comments: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Present when the issue is really a pull request
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl SourceIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.state == IssueState::Closed
    }

    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|label| label.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceComment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    pub html_url: String,
    pub user: SourceUser,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRepository {
    pub name: String,
    pub owner: SourceUser,
}
