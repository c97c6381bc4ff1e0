use issuesync_domain::{RepositorySyncConfig, Result, SourceComment, SourceIssue};
use tracing::{debug, instrument};

use super::IncrementalHandlers;

impl IncrementalHandlers {
    /// Mirror a new comment onto the target issue
    #[instrument(skip_all, fields(issue_url = %issue.html_url, comment_id = comment.id))]
    pub async fn comment_created(
        &self,
        repo: &RepositorySyncConfig,
        issue: &SourceIssue,
        comment: &SourceComment,
    ) -> Result<()> {
        let target = self.ctx.correlation.find_issue(&repo.jira_project, issue.id).await?;
        let body = self.ctx.projector.format_comment(comment).await;
        let created = self.ctx.target.add_comment(&target.id, &body).await?;
        debug!(target_issue = %target.key, target_comment = %created.id, "comment added");
        Ok(())
    }

    /// Rewrite the mirrored comment; NotFound when it was never mirrored
    #[instrument(skip_all, fields(issue_url = %issue.html_url, comment_id = comment.id))]
    pub async fn comment_edited(
        &self,
        repo: &RepositorySyncConfig,
        issue: &SourceIssue,
        comment: &SourceComment,
    ) -> Result<()> {
        let target = self.ctx.correlation.find_issue(&repo.jira_project, issue.id).await?;
        let existing = self.ctx.correlation.find_comment(&target.id, comment.id).await?;
        let body = self.ctx.projector.format_comment(comment).await;
        self.ctx.target.update_comment(&target.id, &existing.id, &body).await
    }

    /// Remove the mirrored comment; NotFound when it was never mirrored
    #[instrument(skip_all, fields(issue_url = %issue.html_url, comment_id = comment.id))]
    pub async fn comment_deleted(
        &self,
        repo: &RepositorySyncConfig,
        issue: &SourceIssue,
        comment: &SourceComment,
    ) -> Result<()> {
        let target = self.ctx.correlation.find_issue(&repo.jira_project, issue.id).await?;
        let existing = self.ctx.correlation.find_comment(&target.id, comment.id).await?;
        self.ctx.target.delete_comment(&target.id, &existing.id).await
    }
}
