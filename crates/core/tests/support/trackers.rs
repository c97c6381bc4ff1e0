//! In-memory tracker fakes
//!
//! `FakeTarget` keeps issues and comments in memory, answers correlation
//! queries by parsing the query string and records every mutating call so
//! tests can assert on both state and traffic.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use issuesync_core::{MarkdownConverter, SourceTracker, TargetTracker, WatermarkStore};
use issuesync_domain::{
    FieldDefinition, IssueProjection, IssueUpdate, Result, SourceComment, SourceIssue, SyncError,
    TargetComment, TargetIssue,
};
use parking_lot::Mutex;
use regex::Regex;

use super::GITHUB_ID_FIELD;

/// Stored target issue plus the fields only the fake tracks
#[derive(Debug, Clone, PartialEq)]
pub struct StoredIssue {
    pub issue: TargetIssue,
    pub project: String,
    pub source_id: Option<u64>,
    pub description: String,
    pub projection: IssueProjection,
    pub comments: Vec<TargetComment>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { summary: String, assignee: Option<String> },
    Update { key: String, update: IssueUpdate },
    Assignee { id: String, assignee: Option<String> },
    Transition { id: String, transition: String },
    AddComment { id: String },
    UpdateComment { id: String, comment: String },
    DeleteComment { id: String, comment: String },
}

#[derive(Default)]
struct TargetState {
    issues: Vec<StoredIssue>,
    calls: Vec<Call>,
    searches: usize,
    next_id: u64,
    hidden_searches: usize,
    create_failures: VecDeque<SyncError>,
    failing_transitions: HashSet<String>,
    fail_updates: bool,
    transition_status: HashMap<String, String>,
}

#[derive(Default)]
pub struct FakeTarget {
    state: Mutex<TargetState>,
}

impl FakeTarget {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Transition id to the status category it moves the issue into
    pub fn with_transition(self: Arc<Self>, transition: &str, category: &str) -> Arc<Self> {
        self.state.lock().transition_status.insert(transition.to_string(), category.to_string());
        self
    }

    /// Seed an issue as if it had been created earlier
    pub fn seed(&self, project: &str, source_id: u64, issue: TargetIssue) {
        let mut state = self.state.lock();
        state.issues.push(StoredIssue {
            issue,
            project: project.to_string(),
            source_id: Some(source_id),
            description: String::new(),
            projection: IssueProjection::default(),
            comments: Vec::new(),
        });
    }

    pub fn seed_comment(&self, issue_id: &str, comment_id: &str, body: &str) {
        let mut state = self.state.lock();
        if let Some(stored) = state.issues.iter_mut().find(|s| s.issue.id == issue_id) {
            stored.comments.push(TargetComment { id: comment_id.to_string(), body: body.to_string() });
        }
    }

    /// Make the next `count` searches come back empty
    pub fn hide_searches(&self, count: usize) {
        self.state.lock().hidden_searches = count;
    }

    pub fn fail_next_create(&self, error: SyncError) {
        self.state.lock().create_failures.push_back(error);
    }

    pub fn fail_transition(&self, transition: &str) {
        self.state.lock().failing_transitions.insert(transition.to_string());
    }

    pub fn fail_updates(&self) {
        self.state.lock().fail_updates = true;
    }

    pub fn issues(&self) -> Vec<StoredIssue> {
        self.state.lock().issues.clone()
    }

    pub fn issue_by_source(&self, source_id: u64) -> Option<StoredIssue> {
        self.state.lock().issues.iter().find(|s| s.source_id == Some(source_id)).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn searches(&self) -> usize {
        self.state.lock().searches
    }

    pub fn create_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| matches!(c, Call::Create { .. })).collect()
    }
}

fn query_pattern() -> Regex {
    Regex::new(r"^project='([^']+)' AND cf\[(\d+)\] = (\d+)$").expect("valid query pattern")
}

#[async_trait]
impl TargetTracker for FakeTarget {
    async fn search_issues(&self, query: &str) -> Result<Vec<TargetIssue>> {
        let caps = query_pattern()
            .captures(query)
            .ok_or_else(|| SyncError::Validation(format!("unparseable query: {query}")))?;
        let project = caps[1].to_string();
        let field: u64 = caps[2].parse().expect("numeric field");
        let source_id: u64 = caps[3].parse().expect("numeric id");
        assert_eq!(field, GITHUB_ID_FIELD, "queries must use the correlation field");

        let mut state = self.state.lock();
        state.searches += 1;
        if state.hidden_searches > 0 {
            state.hidden_searches -= 1;
            return Ok(Vec::new());
        }
        Ok(state
            .issues
            .iter()
            .filter(|s| s.project == project && s.source_id == Some(source_id))
            .map(|s| s.issue.clone())
            .collect())
    }

    async fn create_issue(&self, projection: &IssueProjection) -> Result<TargetIssue> {
        let mut state = self.state.lock();
        state.calls.push(Call::Create {
            summary: projection.summary.clone(),
            assignee: projection.assignee.clone(),
        });
        if let Some(error) = state.create_failures.pop_front() {
            return Err(error);
        }

        state.next_id += 1;
        let number = state.next_id;
        let issue = TargetIssue {
            id: (10_000 + number).to_string(),
            key: format!("{}-{number}", projection.project_key),
            summary: projection.summary.clone(),
            issue_type: Some(projection.issue_type.clone()),
            components: projection.components.clone(),
            assignee: projection.assignee.clone(),
            status_category: Some("To Do".to_string()),
        };
        let source_id = projection
            .custom_fields
            .get(&format!("customfield_{GITHUB_ID_FIELD}"))
            .and_then(serde_json::Value::as_u64);
        state.issues.push(StoredIssue {
            issue: issue.clone(),
            project: projection.project_key.clone(),
            source_id,
            description: projection.description.clone(),
            projection: projection.clone(),
            comments: Vec::new(),
        });
        Ok(TargetIssue { id: issue.id, key: issue.key, ..TargetIssue::default() })
    }

    async fn update_issue(&self, issue_key: &str, update: &IssueUpdate) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::Update { key: issue_key.to_string(), update: update.clone() });
        if state.fail_updates {
            return Err(SyncError::Validation(format!("update of {issue_key} rejected")));
        }
        let stored = state
            .issues
            .iter_mut()
            .find(|s| s.issue.key == issue_key)
            .ok_or_else(|| SyncError::NotFound(issue_key.to_string()))?;
        if let Some(summary) = &update.summary {
            stored.issue.summary = summary.clone();
        }
        if let Some(description) = &update.description {
            stored.description = description.clone();
        }
        if let Some(issue_type) = &update.issue_type {
            stored.issue.issue_type = Some(issue_type.clone());
        }
        if let Some(components) = &update.components {
            stored.issue.components = components.clone();
        }
        Ok(())
    }

    async fn update_assignee(&self, issue_id: &str, assignee: Option<&str>) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::Assignee {
            id: issue_id.to_string(),
            assignee: assignee.map(str::to_string),
        });
        let stored = find_by_id(&mut state.issues, issue_id)?;
        stored.issue.assignee = assignee.map(str::to_string);
        Ok(())
    }

    async fn do_transition(&self, issue_id: &str, transition_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::Transition {
            id: issue_id.to_string(),
            transition: transition_id.to_string(),
        });
        if state.failing_transitions.contains(transition_id) {
            return Err(SyncError::Validation(format!("transition {transition_id} not allowed")));
        }
        let category = state.transition_status.get(transition_id).cloned();
        let stored = find_by_id(&mut state.issues, issue_id)?;
        if let Some(category) = category {
            stored.issue.status_category = Some(category);
        }
        Ok(())
    }

    async fn list_comments(&self, issue_id: &str) -> Result<Vec<TargetComment>> {
        let mut state = self.state.lock();
        Ok(find_by_id(&mut state.issues, issue_id)?.comments.clone())
    }

    async fn add_comment(&self, issue_id: &str, body: &str) -> Result<TargetComment> {
        let mut state = self.state.lock();
        state.calls.push(Call::AddComment { id: issue_id.to_string() });
        state.next_id += 1;
        let comment = TargetComment { id: format!("c{}", state.next_id), body: body.to_string() };
        find_by_id(&mut state.issues, issue_id)?.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, issue_id: &str, comment_id: &str, body: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::UpdateComment {
            id: issue_id.to_string(),
            comment: comment_id.to_string(),
        });
        let stored = find_by_id(&mut state.issues, issue_id)?;
        let comment = stored
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| SyncError::NotFound(comment_id.to_string()))?;
        comment.body = body.to_string();
        Ok(())
    }

    async fn delete_comment(&self, issue_id: &str, comment_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::DeleteComment {
            id: issue_id.to_string(),
            comment: comment_id.to_string(),
        });
        let stored = find_by_id(&mut state.issues, issue_id)?;
        stored.comments.retain(|c| c.id != comment_id);
        Ok(())
    }

    async fn list_fields(&self) -> Result<Vec<FieldDefinition>> {
        Ok(vec![FieldDefinition {
            id: format!("customfield_{GITHUB_ID_FIELD}"),
            name: "GitHub ID".to_string(),
            custom: true,
            custom_id: Some(GITHUB_ID_FIELD),
        }])
    }
}

fn find_by_id<'a>(issues: &'a mut [StoredIssue], issue_id: &str) -> Result<&'a mut StoredIssue> {
    issues
        .iter_mut()
        .find(|s| s.issue.id == issue_id)
        .ok_or_else(|| SyncError::NotFound(issue_id.to_string()))
}

#[derive(Default)]
struct SourceState {
    issues: HashMap<String, Vec<SourceIssue>>,
    comments: HashMap<u64, Vec<SourceComment>>,
    failing_repos: HashSet<String>,
    issue_windows: Vec<DateTime<Utc>>,
}

/// Source tracker serving fixed issues per repository
#[derive(Default)]
pub struct FakeSource {
    state: Mutex<SourceState>,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_issues(&self, repo: &str, issues: Vec<SourceIssue>) {
        self.state.lock().issues.insert(repo.to_string(), issues);
    }

    pub fn set_comments(&self, issue_number: u64, comments: Vec<SourceComment>) {
        self.state.lock().comments.insert(issue_number, comments);
    }

    pub fn fail_repo(&self, repo: &str) {
        self.state.lock().failing_repos.insert(repo.to_string());
    }

    /// `since` values seen by `list_issues`
    pub fn issue_windows(&self) -> Vec<DateTime<Utc>> {
        self.state.lock().issue_windows.clone()
    }
}

#[async_trait]
impl SourceTracker for FakeSource {
    async fn list_issues(
        &self,
        _owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourceIssue>> {
        let mut state = self.state.lock();
        state.issue_windows.push(since);
        if state.failing_repos.contains(repo) {
            return Err(SyncError::Network(format!("listing {repo} failed")));
        }
        Ok(state.issues.get(repo).cloned().unwrap_or_default())
    }

    async fn list_comments(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
        _since: DateTime<Utc>,
    ) -> Result<Vec<SourceComment>> {
        Ok(self.state.lock().comments.get(&number).cloned().unwrap_or_default())
    }
}

/// Converter returning its input
pub struct IdentityConverter;

#[async_trait]
impl MarkdownConverter for IdentityConverter {
    async fn convert(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

#[derive(Default)]
pub struct MemoryWatermark {
    value: Mutex<Option<DateTime<Utc>>>,
    writes: Mutex<usize>,
}

impl MemoryWatermark {
    pub fn new(initial: Option<DateTime<Utc>>) -> Arc<Self> {
        Arc::new(Self { value: Mutex::new(initial), writes: Mutex::new(0) })
    }

    pub fn value(&self) -> Option<DateTime<Utc>> {
        *self.value.lock()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }
}

#[async_trait]
impl WatermarkStore for MemoryWatermark {
    async fn read(&self) -> Option<DateTime<Utc>> {
        *self.value.lock()
    }

    async fn write(&self, at: DateTime<Utc>) -> Result<()> {
        *self.value.lock() = Some(at);
        *self.writes.lock() += 1;
        Ok(())
    }
}
