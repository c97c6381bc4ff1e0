//! Fixture builders for source objects and mappings

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use issuesync_core::SyncMappings;
use issuesync_domain::{
    IssueState, RepositorySyncConfig, SourceComment, SourceIssue, SourceLabel, SourceUser,
};

pub const OWNER: &str = "pingcap";
pub const REPO: &str = "tidb";
pub const PROJECT: &str = "TIDB";

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 8, 0, 0).single().expect("valid fixture date")
}

pub fn user(login: &str) -> SourceUser {
    SourceUser {
        login: login.to_string(),
        html_url: format!("https://github.com/{login}"),
        name: None,
    }
}

pub fn source_issue(id: u64, number: u64, title: &str) -> SourceIssue {
    SourceIssue {
        id,
        number,
        title: title.to_string(),
        body: Some("B".to_string()),
        html_url: format!("https://github.com/{OWNER}/{REPO}/issues/{number}"),
        state: IssueState::Open,
        user: user("octocat"),
        assignee: None,
        labels: Vec::new(),
        comments: 0,
        created_at: at(2019, 5, 1),
        updated_at: None,
        pull_request: None,
    }
}

pub fn with_labels(mut issue: SourceIssue, labels: &[&str]) -> SourceIssue {
    issue.labels = labels.iter().map(|name| SourceLabel { name: name.to_string() }).collect();
    issue
}

pub fn closed(mut issue: SourceIssue) -> SourceIssue {
    issue.state = IssueState::Closed;
    issue
}

pub fn source_comment(id: u64, issue_number: u64, body: &str) -> SourceComment {
    SourceComment {
        id,
        body: body.to_string(),
        html_url: format!(
            "https://github.com/{OWNER}/{REPO}/issues/{issue_number}#issuecomment-{id}"
        ),
        user: user("commenter"),
        created_at: at(2019, 5, 2),
    }
}

pub fn repo_config() -> RepositorySyncConfig {
    RepositorySyncConfig {
        github_owner: OWNER.to_string(),
        jira_project: PROJECT.to_string(),
        jira_components: vec!["sql".to_string()],
        jira_issuetype: "Task".to_string(),
        carry_source_url: false,
        issuetype_label_map: HashMap::from([("type/bug".to_string(), "Bug".to_string())]),
        component_label_map: HashMap::from([(
            "component/planner".to_string(),
            "planner".to_string(),
        )]),
        transition_map: HashMap::from([
            ("Done".to_string(), vec!["31".to_string()]),
            ("To Do".to_string(), vec!["11".to_string()]),
        ]),
    }
}

pub fn mappings() -> SyncMappings {
    let mut mappings = SyncMappings::default();
    mappings.repos.insert(REPO.to_string(), repo_config());
    mappings.assignees.insert("alice".to_string(), "alice.jira".to_string());
    mappings
}
