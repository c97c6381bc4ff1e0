use issuesync_domain::constants::{TRANSITION_DONE, TRANSITION_TODO};
use issuesync_domain::{RepositorySyncConfig, Result, SourceIssue, SourceUser, SyncError, TargetIssue};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

use super::{apply_transitions, IncrementalHandlers};
use crate::sync::context::SyncContext;

static ASSIGNEE_REJECTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"assignee.*User.*does not exist").expect("ASSIGNEE_REJECTED should compile - this is a bug")
});

/// True when the tracker refused a create because the assignee is unknown
pub(crate) fn is_assignee_rejection(err: &SyncError) -> bool {
    matches!(err, SyncError::Validation(_)) && ASSIGNEE_REJECTED.is_match(&err.to_string())
}

/// Project and create the target issue for `issue`.
///
/// An "assignee does not exist" rejection is retried exactly once with the
/// assignee cleared; anything else is returned as-is.
pub(crate) async fn create_target_issue(
    ctx: &SyncContext,
    repo: &RepositorySyncConfig,
    issue: &SourceIssue,
) -> Result<TargetIssue> {
    let mut projection = ctx.projector.project_new_issue(issue, repo, &ctx.mappings).await;
    let mut retried = false;
    loop {
        match ctx.target.create_issue(&projection).await {
            Ok(created) => {
                debug!(target_issue = %created.key, issue_url = %issue.html_url, "target issue created");
                return Ok(created);
            }
            Err(err) if !retried && projection.assignee.is_some() && is_assignee_rejection(&err) => {
                warn!(
                    assignee = projection.assignee.as_deref().unwrap_or_default(),
                    issue_url = %issue.html_url,
                    "retry create issue without assignee"
                );
                projection.assignee = None;
                retried = true;
            }
            Err(err) => return Err(err),
        }
    }
}

impl IncrementalHandlers {
    /// Create the target issue, retrying once without an assignee the tracker rejects
    #[instrument(skip_all, fields(issue_url = %issue.html_url))]
    pub async fn issue_opened(
        &self,
        repo: &RepositorySyncConfig,
        issue: &SourceIssue,
    ) -> Result<TargetIssue> {
        create_target_issue(&self.ctx, repo, issue).await
    }

    /// Move the target issue to Done
    #[instrument(skip_all, fields(issue_url = %issue.html_url))]
    pub async fn issue_closed(&self, repo: &RepositorySyncConfig, issue: &SourceIssue) -> Result<()> {
        let target = self.ctx.correlation.find_issue(&repo.jira_project, issue.id).await?;
        apply_transitions(self.ctx.target.as_ref(), &target.id, repo.transitions(TRANSITION_DONE)).await
    }

    /// Move the target issue back to To Do
    #[instrument(skip_all, fields(issue_url = %issue.html_url))]
    pub async fn issue_reopened(
        &self,
        repo: &RepositorySyncConfig,
        issue: &SourceIssue,
    ) -> Result<()> {
        let target = self.ctx.correlation.find_issue(&repo.jira_project, issue.id).await?;
        apply_transitions(self.ctx.target.as_ref(), &target.id, repo.transitions(TRANSITION_TODO)).await
    }

    /// Push the new summary and description
    #[instrument(skip_all, fields(issue_url = %issue.html_url))]
    pub async fn issue_edited(&self, repo: &RepositorySyncConfig, issue: &SourceIssue) -> Result<()> {
        let target = self.ctx.correlation.find_issue(&repo.jira_project, issue.id).await?;
        let update = self.ctx.projector.project_updated_issue(issue).await;
        self.ctx.target.update_issue(&target.key, &update).await
    }

    /// Set the mapped assignee. Waits for a racing create through the
    /// correlation backoff; an unmapped login is a no-op.
    #[instrument(skip_all, fields(issue_url = %issue.html_url))]
    pub async fn issue_assigned(
        &self,
        repo: &RepositorySyncConfig,
        issue: &SourceIssue,
        assignee: Option<&SourceUser>,
    ) -> Result<()> {
        let target = self.ctx.correlation.await_issue(&repo.jira_project, issue.id).await?;
        let login = assignee.map(|user| user.login.as_str()).unwrap_or_default();
        let Some(name) = self.ctx.mappings.target_user(login) else {
            warn!(login, "assigned GitHub user login could not find corresponding target user");
            return Ok(());
        };
        self.ctx.target.update_assignee(&target.id, Some(name)).await
    }

    /// Clear the assignee, but only when it is still the mapped user
    #[instrument(skip_all, fields(issue_url = %issue.html_url))]
    pub async fn issue_unassigned(
        &self,
        repo: &RepositorySyncConfig,
        issue: &SourceIssue,
        assignee: Option<&SourceUser>,
    ) -> Result<()> {
        let target = self.ctx.correlation.await_issue(&repo.jira_project, issue.id).await?;
        let login = assignee.map(|user| user.login.as_str()).unwrap_or_default();
        let Some(name) = self.ctx.mappings.target_user(login) else {
            warn!(login, "unassigned GitHub user login could not find corresponding target user");
            return Ok(());
        };
        if target.assignee.as_deref() != Some(name) {
            debug!(
                intended = name,
                current = target.assignee.as_deref().unwrap_or_default(),
                "current assignee differs, leaving it"
            );
            return Ok(());
        }
        self.ctx.target.update_assignee(&target.id, None).await
    }

    /// Apply the label rules for an added label
    #[instrument(skip_all, fields(issue_url = %issue.html_url, label = %label))]
    pub async fn issue_labeled(
        &self,
        repo: &RepositorySyncConfig,
        issue: &SourceIssue,
        label: &str,
    ) -> Result<()> {
        let target = self.ctx.correlation.await_issue(&repo.jira_project, issue.id).await?;
        self.ctx.rules.apply_labeled(self.ctx.target.as_ref(), repo, label, &target).await
    }

    /// Apply the label rules for a removed label
    #[instrument(skip_all, fields(issue_url = %issue.html_url, label = %label))]
    pub async fn issue_unlabeled(
        &self,
        repo: &RepositorySyncConfig,
        issue: &SourceIssue,
        label: &str,
    ) -> Result<()> {
        let target = self.ctx.correlation.find_issue(&repo.jira_project, issue.id).await?;
        self.ctx.rules.apply_unlabeled(self.ctx.target.as_ref(), repo, label, &target).await
    }
}
