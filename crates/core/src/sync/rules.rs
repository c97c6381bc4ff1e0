//! Label-driven projection rules
//!
//! Each rule decides, from the repository maps and the current target issue,
//! which update (if any) a label change calls for. Rules never fail on a
//! missing mapping and return `None` when the issue is already in the desired
//! state. [`LabelRules`] evaluates every rule and aggregates failures instead
//! of stopping at the first one.

use issuesync_domain::constants::FALLBACK_COMPONENT;
use issuesync_domain::{IssueUpdate, RepositorySyncConfig, Result, SyncError, TargetIssue};
use tracing::{debug, error};

use super::ports::TargetTracker;

/// One label-driven field rule (issue type, component)
pub trait LabelRule: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Update for a label that was just added
    fn on_labeled(
        &self,
        repo: &RepositorySyncConfig,
        label: &str,
        issue: &TargetIssue,
    ) -> Option<IssueUpdate>;

    /// Update for a label that was just removed
    fn on_unlabeled(
        &self,
        repo: &RepositorySyncConfig,
        label: &str,
        issue: &TargetIssue,
    ) -> Option<IssueUpdate>;

    /// Update bringing an existing issue in line with the full label set
    fn converge(
        &self,
        repo: &RepositorySyncConfig,
        labels: &[&str],
        issue: &TargetIssue,
    ) -> Option<IssueUpdate>;

    /// Update for a freshly created issue; only mapped labels contribute
    fn backfill(&self, repo: &RepositorySyncConfig, labels: &[&str]) -> Option<IssueUpdate>;
}

fn mapped<'a>(map: &'a std::collections::HashMap<String, String>, labels: &[&str]) -> Vec<&'a str> {
    labels.iter().filter_map(|label| map.get(*label).map(String::as_str)).collect()
}

/// Issue category from `issuetype-label-map`
pub struct CategoryByLabel;

impl LabelRule for CategoryByLabel {
    fn name(&self) -> &'static str {
        "category-by-label"
    }

    fn on_labeled(
        &self,
        repo: &RepositorySyncConfig,
        label: &str,
        issue: &TargetIssue,
    ) -> Option<IssueUpdate> {
        let wanted = repo.issuetype_label_map.get(label)?;
        if issue.is_type(wanted) {
            debug!(issue_type = %wanted, "issue already has the type");
            return None;
        }
        Some(IssueUpdate::issue_type(wanted.clone()))
    }

    fn on_unlabeled(
        &self,
        repo: &RepositorySyncConfig,
        label: &str,
        issue: &TargetIssue,
    ) -> Option<IssueUpdate> {
        let mapped = repo.issuetype_label_map.get(label)?;
        if !issue.is_type(mapped) {
            debug!(issue_type = %mapped, "issue is not the label's type");
            return None;
        }
        Some(IssueUpdate::issue_type(repo.jira_issuetype.clone()))
    }

    fn converge(
        &self,
        repo: &RepositorySyncConfig,
        labels: &[&str],
        issue: &TargetIssue,
    ) -> Option<IssueUpdate> {
        let types = mapped(&repo.issuetype_label_map, labels);
        let wanted = match types.first() {
            Some(first) if !types.iter().any(|t| issue.is_type(t)) => (*first).to_string(),
            Some(_) => return None,
            None => repo.jira_issuetype.clone(),
        };
        (!wanted.is_empty()).then(|| IssueUpdate::issue_type(wanted))
    }

    fn backfill(&self, repo: &RepositorySyncConfig, labels: &[&str]) -> Option<IssueUpdate> {
        mapped(&repo.issuetype_label_map, labels).first().map(|t| IssueUpdate::issue_type(*t))
    }
}

/// Components from `component-label-map`
pub struct ComponentByLabel;

impl LabelRule for ComponentByLabel {
    fn name(&self) -> &'static str {
        "component-by-label"
    }

    fn on_labeled(
        &self,
        repo: &RepositorySyncConfig,
        label: &str,
        issue: &TargetIssue,
    ) -> Option<IssueUpdate> {
        let wanted = repo.component_label_map.get(label)?;
        if issue.has_component(wanted) {
            debug!(component = %wanted, "issue already in the component");
            return None;
        }
        Some(IssueUpdate::components(vec![wanted.clone()]))
    }

    fn on_unlabeled(
        &self,
        repo: &RepositorySyncConfig,
        label: &str,
        issue: &TargetIssue,
    ) -> Option<IssueUpdate> {
        let mapped = repo.component_label_map.get(label)?;
        if !issue.has_component(mapped) {
            debug!(component = %mapped, "issue not in the component");
            return None;
        }
        let mut remaining: Vec<String> =
            issue.components.iter().filter(|c| *c != mapped).cloned().collect();
        if remaining.is_empty() {
            remaining.push(FALLBACK_COMPONENT.to_string());
        }
        Some(IssueUpdate::components(remaining))
    }

    fn converge(
        &self,
        repo: &RepositorySyncConfig,
        labels: &[&str],
        _issue: &TargetIssue,
    ) -> Option<IssueUpdate> {
        let mut components: Vec<String> =
            mapped(&repo.component_label_map, labels).into_iter().map(str::to_string).collect();
        if components.is_empty() {
            components = repo.jira_components.clone();
        }
        (!components.is_empty()).then(|| IssueUpdate::components(components))
    }

    fn backfill(&self, repo: &RepositorySyncConfig, labels: &[&str]) -> Option<IssueUpdate> {
        let components: Vec<String> =
            mapped(&repo.component_label_map, labels).into_iter().map(str::to_string).collect();
        (!components.is_empty()).then(|| IssueUpdate::components(components))
    }
}

/// Which decision of each rule to apply
#[derive(Debug, Clone, Copy)]
enum Trigger<'a> {
    Labeled(&'a str),
    Unlabeled(&'a str),
    Converge(&'a [&'a str]),
    Backfill(&'a [&'a str]),
}

/// Fixed registry of label rules
pub struct LabelRules {
    rules: Vec<Box<dyn LabelRule>>,
}

impl LabelRules {
    /// Category and component rules
    pub fn standard() -> Self {
        Self { rules: vec![Box::new(CategoryByLabel), Box::new(ComponentByLabel)] }
    }

    pub fn new(rules: Vec<Box<dyn LabelRule>>) -> Self {
        Self { rules }
    }

    pub async fn apply_labeled(
        &self,
        target: &dyn TargetTracker,
        repo: &RepositorySyncConfig,
        label: &str,
        issue: &TargetIssue,
    ) -> Result<()> {
        self.apply(target, repo, Trigger::Labeled(label), issue).await
    }

    pub async fn apply_unlabeled(
        &self,
        target: &dyn TargetTracker,
        repo: &RepositorySyncConfig,
        label: &str,
        issue: &TargetIssue,
    ) -> Result<()> {
        self.apply(target, repo, Trigger::Unlabeled(label), issue).await
    }

    pub async fn apply_converge(
        &self,
        target: &dyn TargetTracker,
        repo: &RepositorySyncConfig,
        labels: &[&str],
        issue: &TargetIssue,
    ) -> Result<()> {
        self.apply(target, repo, Trigger::Converge(labels), issue).await
    }

    pub async fn apply_backfill(
        &self,
        target: &dyn TargetTracker,
        repo: &RepositorySyncConfig,
        labels: &[&str],
        issue: &TargetIssue,
    ) -> Result<()> {
        self.apply(target, repo, Trigger::Backfill(labels), issue).await
    }

    async fn apply(
        &self,
        target: &dyn TargetTracker,
        repo: &RepositorySyncConfig,
        trigger: Trigger<'_>,
        issue: &TargetIssue,
    ) -> Result<()> {
        let mut failures: Vec<SyncError> = Vec::new();
        for rule in &self.rules {
            let update = match trigger {
                Trigger::Labeled(label) => rule.on_labeled(repo, label, issue),
                Trigger::Unlabeled(label) => rule.on_unlabeled(repo, label, issue),
                Trigger::Converge(labels) => rule.converge(repo, labels, issue),
                Trigger::Backfill(labels) => rule.backfill(repo, labels),
            };
            let Some(update) = update else {
                continue;
            };
            if let Err(err) = target.update_issue(&issue.key, &update).await {
                error!(rule = rule.name(), target_issue = %issue.key, error = %err, "label rule failed");
                failures.push(err);
            }
        }
        SyncError::aggregate(failures)
    }
}

impl Default for LabelRules {
    fn default() -> Self {
        Self::standard()
    }
}
