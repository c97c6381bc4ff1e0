//! Event dispatcher: decodes webhook deliveries and routes them to the
//! incremental handlers

use std::sync::Arc;

use issuesync_domain::{
    CommentAction, IssueCommentEvent, IssuesAction, IssuesEvent, Result, SyncError, WebhookEvent,
};
use tracing::{debug, info, instrument, warn};

use super::context::SyncContext;
use super::handlers::IncrementalHandlers;

pub const EVENT_ISSUES: &str = "issues";
pub const EVENT_ISSUE_COMMENT: &str = "issue_comment";

/// Routes raw webhook deliveries to the incremental handlers
pub struct EventDispatcher {
    handlers: IncrementalHandlers,
}

impl EventDispatcher {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self { handlers: IncrementalHandlers::new(ctx) }
    }

    /// Handlers deliveries are routed to
    pub fn handlers(&self) -> &IncrementalHandlers {
        &self.handlers
    }

    /// Decode a payload by its event type header
    pub fn decode(event_type: &str, payload: &[u8]) -> Result<WebhookEvent> {
        let invalid = |e: serde_json::Error| SyncError::InvalidInput(format!("{event_type} payload: {e}"));
        match event_type {
            EVENT_ISSUES => serde_json::from_slice::<IssuesEvent>(payload)
                .map(|event| WebhookEvent::Issues(Box::new(event)))
                .map_err(invalid),
            EVENT_ISSUE_COMMENT => serde_json::from_slice::<IssueCommentEvent>(payload)
                .map(|event| WebhookEvent::IssueComment(Box::new(event)))
                .map_err(invalid),
            other => Err(SyncError::UnsupportedEvent(other.to_string())),
        }
    }

    /// Decode and dispatch one delivery
    #[instrument(skip(self, payload))]
    pub async fn handle_delivery(
        &self,
        event_type: &str,
        delivery_id: &str,
        payload: &[u8],
    ) -> Result<()> {
        let event = match Self::decode(event_type, payload) {
            Ok(event) => event,
            Err(err @ SyncError::UnsupportedEvent(_)) => {
                warn!(event_type, "Unsupported type");
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        self.dispatch(event).await
    }

    /// Route a decoded event. Pull requests, unknown actions and repositories
    /// without configuration are ignored.
    pub async fn dispatch(&self, event: WebhookEvent) -> Result<()> {
        let issue = event.issue();
        let repository = event.repository();
        if issue.is_pull_request() {
            info!(repo = %repository.name, number = issue.number, "not handling pull request issue");
            return Ok(());
        }

        let ctx = self.handlers.context();
        let Some(repo) = ctx.mappings.repo(&repository.name) else {
            warn!(repo = %repository.name, "repository is not configured, ignoring event");
            return Ok(());
        };

        match &event {
            WebhookEvent::Issues(event) => {
                debug!(
                    org = %event.repository.owner.login,
                    repo = %event.repository.name,
                    number = event.issue.number,
                    author = %event.issue.user.login,
                    action = ?event.action,
                    "issue event"
                );
                let issue = &event.issue;
                let label = event.label.as_ref().map(|l| l.name.as_str()).unwrap_or_default();
                match event.action {
                    IssuesAction::Opened => self.handlers.issue_opened(repo, issue).await.map(|_| ()),
                    IssuesAction::Closed => self.handlers.issue_closed(repo, issue).await,
                    IssuesAction::Reopened => self.handlers.issue_reopened(repo, issue).await,
                    IssuesAction::Edited => self.handlers.issue_edited(repo, issue).await,
                    IssuesAction::Assigned => {
                        self.handlers.issue_assigned(repo, issue, event.assignee.as_ref()).await
                    }
                    IssuesAction::Unassigned => {
                        self.handlers.issue_unassigned(repo, issue, event.assignee.as_ref()).await
                    }
                    IssuesAction::Labeled => self.handlers.issue_labeled(repo, issue, label).await,
                    IssuesAction::Unlabeled => {
                        self.handlers.issue_unlabeled(repo, issue, label).await
                    }
                    IssuesAction::Other => Ok(()),
                }
            }
            WebhookEvent::IssueComment(event) => {
                debug!(
                    org = %event.repository.owner.login,
                    repo = %event.repository.name,
                    number = event.issue.number,
                    author = %event.comment.user.login,
                    action = ?event.action,
                    "issue comment event"
                );
                let (issue, comment) = (&event.issue, &event.comment);
                match event.action {
                    CommentAction::Created => self.handlers.comment_created(repo, issue, comment).await,
                    CommentAction::Edited => self.handlers.comment_edited(repo, issue, comment).await,
                    CommentAction::Deleted => self.handlers.comment_deleted(repo, issue, comment).await,
                    CommentAction::Other => Ok(()),
                }
            }
        }
    }
}
