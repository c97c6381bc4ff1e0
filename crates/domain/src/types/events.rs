//! Webhook payloads for issue and issue-comment events

use serde::{Deserialize, Serialize};

use super::source::{SourceComment, SourceIssue, SourceLabel, SourceRepository, SourceUser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuesAction {
    Opened,
    Closed,
    Reopened,
    Edited,
    Assigned,
    Unassigned,
    Labeled,
    Unlabeled,
    /// Actions the engine does not act on (milestoned, pinned, ...)
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    Created,
    Edited,
    Deleted,
    #[serde(other)]
    Other,
}

/// `issues` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuesEvent {
    pub action: IssuesAction,
    pub issue: SourceIssue,
    pub repository: SourceRepository,
    /// User added or removed by an assign/unassign action
    #[serde(default)]
    pub assignee: Option<SourceUser>,
    /// Label added or removed by a label/unlabel action
    #[serde(default)]
    pub label: Option<SourceLabel>,
}

/// `issue_comment` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    pub action: CommentAction,
    pub issue: SourceIssue,
    pub comment: SourceComment,
    pub repository: SourceRepository,
}

/// A decoded webhook delivery
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    Issues(Box<IssuesEvent>),
    IssueComment(Box<IssueCommentEvent>),
}

impl WebhookEvent {
    pub fn repository(&self) -> &SourceRepository {
        match self {
            Self::Issues(event) => &event.repository,
            Self::IssueComment(event) => &event.repository,
        }
    }

    pub fn issue(&self) -> &SourceIssue {
        match self {
            Self::Issues(event) => &event.issue,
            Self::IssueComment(event) => &event.issue,
        }
    }
}
