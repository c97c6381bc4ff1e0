//! Reconciliation engine
//!
//! One pass over every configured repository:
//! 1. list source issues since the window start
//! 2. create missing target issues one at a time (avoids duplicate creates)
//! 3. update every issue concurrently, bounded by a per-repository semaphore
//! 4. write the watermark once all repositories have finished
//!
//! Failures are isolated to the repository or issue that produced them and
//! collected in a [`ReconcileReport`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Months, Utc};
use issuesync_domain::constants::{
    DEFAULT_LOOKBACK_MONTHS, TRANSITION_DONE, TRANSITION_TODO, WATERMARK_OVERLAP_DAYS,
};
use issuesync_domain::{RepositorySyncConfig, Result, SourceIssue, SyncError, TargetIssue};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use super::context::SyncContext;
use super::correlation::{has_comment_token, match_comment};
use super::handlers::{apply_transitions, create_target_issue};
use super::ports::WatermarkStore;

/// Step of the pass a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStage {
    ListIssues,
    Correlate,
    Create,
    Backfill,
    UpdateFields,
    Assignee,
    Transition,
    Labels,
    Comments,
    Task,
}

/// One failed step of a reconciliation pass
#[derive(Debug)]
pub struct ReconcileFailure {
    pub repository: String,
    pub issue_url: Option<String>,
    pub stage: ReconcileStage,
    pub error: SyncError,
}

/// Outcome of a pass (or of one repository or issue within it)
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub since: Option<DateTime<Utc>>,
    pub repositories: usize,
    pub issues: usize,
    pub created: usize,
    pub updated: usize,
    pub failures: Vec<ReconcileFailure>,
}

impl ReconcileReport {
    /// True when no step failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Most recently recorded failure
    pub fn last_error(&self) -> Option<&SyncError> {
        self.failures.last().map(|f| &f.error)
    }

    fn merge(&mut self, other: ReconcileReport) {
        self.repositories += other.repositories;
        self.issues += other.issues;
        self.created += other.created;
        self.updated += other.updated;
        self.failures.extend(other.failures);
    }

    fn fail(
        &mut self,
        repository: &str,
        issue: Option<&SourceIssue>,
        stage: ReconcileStage,
        error: SyncError,
    ) {
        error!(
            repo = repository,
            issue_url = issue.map(|i| i.html_url.as_str()).unwrap_or_default(),
            stage = ?stage,
            error = %error,
            "reconciliation step failed"
        );
        self.failures.push(ReconcileFailure {
            repository: repository.to_string(),
            issue_url: issue.map(|i| i.html_url.clone()),
            stage,
            error,
        });
    }
}

/// How the lower bound of the source query window is chosen
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowSettings {
    /// Start from the stored watermark (minus the overlap) when present
    pub use_watermark: bool,
    /// Explicit lower bound used when no watermark applies
    pub since: Option<DateTime<Utc>>,
}

/// Fallback window start: three months before `now`
pub fn default_since(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(DEFAULT_LOOKBACK_MONTHS)).unwrap_or(now)
}

/// Bulk pass that converges every configured repository
pub struct ReconciliationEngine {
    ctx: Arc<SyncContext>,
    watermark: Arc<dyn WatermarkStore>,
    window: WindowSettings,
    issue_concurrency: usize,
}

impl ReconciliationEngine {
    pub fn new(
        ctx: Arc<SyncContext>,
        watermark: Arc<dyn WatermarkStore>,
        window: WindowSettings,
        issue_concurrency: usize,
    ) -> Self {
        Self { ctx, watermark, window, issue_concurrency: issue_concurrency.max(1) }
    }

    /// Lower bound of the source query window for a pass starting at `now`
    pub async fn resolve_window(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if self.window.use_watermark {
            match self.watermark.read().await {
                Some(mark) => {
                    debug!(watermark = %mark, "using stored watermark");
                    return mark - Duration::days(WATERMARK_OVERLAP_DAYS);
                }
                None => debug!("no watermark stored, falling back to configured window"),
            }
        }
        self.window.since.unwrap_or_else(|| default_since(now))
    }

    /// Run one full pass. Never aborts early; every failure is in the report.
    #[instrument(skip(self))]
    pub async fn run(&self) -> ReconcileReport {
        let since = self.resolve_window(Utc::now()).await;
        info!(since = %since, repositories = self.ctx.mappings.repos.len(), "starting reconciliation pass");

        let mut repositories = JoinSet::new();
        for (name, repo) in &self.ctx.mappings.repos {
            let ctx = Arc::clone(&self.ctx);
            let name = name.clone();
            let repo = repo.clone();
            let concurrency = self.issue_concurrency;
            repositories.spawn(async move {
                reconcile_repository(ctx, name, repo, since, concurrency).await
            });
        }

        let mut report = ReconcileReport { since: Some(since), ..ReconcileReport::default() };
        while let Some(joined) = repositories.join_next().await {
            match joined {
                Ok(outcome) => report.merge(outcome),
                Err(join_error) => report.fail(
                    "*",
                    None,
                    ReconcileStage::Task,
                    SyncError::Internal(format!("repository task failed: {join_error}")),
                ),
            }
        }

        let finished = Utc::now();
        if let Err(err) = self.watermark.write(finished).await {
            warn!(error = %err, "failed to write watermark");
        }

        info!(
            issues = report.issues,
            created = report.created,
            updated = report.updated,
            failures = report.failures.len(),
            "reconciliation pass finished"
        );
        report
    }
}

#[instrument(skip(ctx, repo, concurrency), fields(project = %repo.jira_project))]
async fn reconcile_repository(
    ctx: Arc<SyncContext>,
    name: String,
    repo: RepositorySyncConfig,
    since: DateTime<Utc>,
    concurrency: usize,
) -> ReconcileReport {
    let mut report = ReconcileReport { repositories: 1, ..ReconcileReport::default() };

    let issues = match ctx.source.list_issues(&repo.github_owner, &name, since).await {
        Ok(issues) => issues,
        Err(err) => {
            report.fail(&name, None, ReconcileStage::ListIssues, err);
            return report;
        }
    };
    report.issues = issues.len();
    debug!(repo = %name, count = issues.len(), "listed source issues");

    // Creation is sequential so two issues never race on one correlation key.
    for issue in &issues {
        match ctx.correlation.find_issue(&repo.jira_project, issue.id).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => match create_and_backfill(&ctx, &repo, issue).await {
                Ok(backfill_failures) => {
                    report.created += 1;
                    for err in backfill_failures {
                        report.fail(&name, Some(issue), ReconcileStage::Backfill, err);
                    }
                }
                Err(err) => report.fail(&name, Some(issue), ReconcileStage::Create, err),
            },
            Err(err) => report.fail(&name, Some(issue), ReconcileStage::Correlate, err),
        }
    }

    let name: Arc<str> = Arc::from(name);
    let repo = Arc::new(repo);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();
    for issue in issues {
        let ctx = Arc::clone(&ctx);
        let name = Arc::clone(&name);
        let repo = Arc::clone(&repo);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    let mut report = ReconcileReport::default();
                    report.fail(
                        &name,
                        Some(&issue),
                        ReconcileStage::Task,
                        SyncError::Internal("Semaphore closed unexpectedly".to_string()),
                    );
                    return report;
                }
            };
            reconcile_issue(&ctx, &name, &repo, &issue, since).await
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => report.merge(outcome),
            Err(join_error) => report.fail(
                &name,
                None,
                ReconcileStage::Task,
                SyncError::Internal(format!("issue task failed: {join_error}")),
            ),
        }
    }
    report
}

/// Create a missing target issue, then best-effort transition and label
/// backfill. Backfill failures are returned, not raised.
async fn create_and_backfill(
    ctx: &SyncContext,
    repo: &RepositorySyncConfig,
    issue: &SourceIssue,
) -> Result<Vec<SyncError>> {
    let created = create_target_issue(ctx, repo, issue).await?;
    let mut failures = Vec::new();

    if issue.is_closed() {
        let transitions = repo.transitions(TRANSITION_DONE);
        if let Err(err) = apply_transitions(ctx.target.as_ref(), &created.id, transitions).await {
            failures.push(err);
        }
    }

    let labels: Vec<&str> = issue.label_names().collect();
    if let Err(err) = ctx.rules.apply_backfill(ctx.target.as_ref(), repo, &labels, &created).await {
        failures.push(err);
    }
    Ok(failures)
}

async fn reconcile_issue(
    ctx: &SyncContext,
    repo_name: &str,
    repo: &RepositorySyncConfig,
    issue: &SourceIssue,
    since: DateTime<Utc>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let target = match ctx.correlation.find_issue(&repo.jira_project, issue.id).await {
        Ok(target) => target,
        Err(err) => {
            report.fail(repo_name, Some(issue), ReconcileStage::Correlate, err);
            return report;
        }
    };

    let update = ctx.projector.project_updated_issue(issue).await;
    if let Err(err) = ctx.target.update_issue(&target.key, &update).await {
        report.fail(repo_name, Some(issue), ReconcileStage::UpdateFields, err);
        return report;
    }

    // Always overwritten, unlike the incremental path.
    let assignee = issue.assignee.as_ref().and_then(|user| {
        let mapped = ctx.mappings.target_user(&user.login);
        if mapped.is_none() {
            warn!(login = %user.login, issue_url = %issue.html_url, "GitHub user login not found in assignee map");
        }
        mapped
    });
    if let Err(err) = ctx.target.update_assignee(&target.id, assignee).await {
        report.fail(repo_name, Some(issue), ReconcileStage::Assignee, err);
    }

    let workflow = match (issue.is_closed(), target.is_done()) {
        (true, false) => Some(TRANSITION_DONE),
        (false, true) => Some(TRANSITION_TODO),
        _ => None,
    };
    if let Some(workflow) = workflow {
        let transitions = repo.transitions(workflow);
        if let Err(err) = apply_transitions(ctx.target.as_ref(), &target.id, transitions).await {
            report.fail(repo_name, Some(issue), ReconcileStage::Transition, err);
        }
    }

    let labels: Vec<&str> = issue.label_names().collect();
    if let Err(err) = ctx.rules.apply_converge(ctx.target.as_ref(), repo, &labels, &target).await {
        report.fail(repo_name, Some(issue), ReconcileStage::Labels, err);
    }

    if let Err(err) = reconcile_comments(ctx, repo_name, repo, issue, &target, since).await {
        report.fail(repo_name, Some(issue), ReconcileStage::Comments, err);
    }

    report.updated = 1;
    report
}

/// Bring target comments in line with the source.
///
/// With zero source comments every token-bearing target comment is deleted.
/// Otherwise each source comment is updated or created; target comments whose
/// source comment is gone are left in place.
async fn reconcile_comments(
    ctx: &SyncContext,
    repo_name: &str,
    repo: &RepositorySyncConfig,
    issue: &SourceIssue,
    target: &TargetIssue,
    since: DateTime<Utc>,
) -> Result<()> {
    let existing = ctx.target.list_comments(&target.id).await?;
    let mut failures = Vec::new();

    if issue.comments == 0 {
        for comment in existing.iter().filter(|c| has_comment_token(&c.body)) {
            if let Err(err) = ctx.target.delete_comment(&target.id, &comment.id).await {
                warn!(target_issue = %target.key, target_comment = %comment.id, error = %err, "delete comment failed");
                failures.push(err);
            }
        }
        return SyncError::aggregate(failures);
    }

    let source_comments =
        ctx.source.list_comments(&repo.github_owner, repo_name, issue.number, since).await?;
    for comment in &source_comments {
        let body = ctx.projector.format_comment(comment).await;
        let result = match match_comment(&existing, comment.id) {
            Some(found) => ctx.target.update_comment(&target.id, &found.id, &body).await,
            None => ctx.target.add_comment(&target.id, &body).await.map(|_| ()),
        };
        if let Err(err) = result {
            warn!(target_issue = %target.key, comment_id = comment.id, error = %err, "sync comment failed");
            failures.push(err);
        }
    }
    SyncError::aggregate(failures)
}
