//! Event routing from raw deliveries to handlers

mod support;

use std::sync::Arc;

use issuesync_core::EventDispatcher;
use issuesync_domain::{SyncError, TargetIssue};
use serde_json::json;
use support::*;

fn dispatcher(target: &Arc<FakeTarget>) -> EventDispatcher {
    EventDispatcher::new(build_context(FakeSource::new(), Arc::clone(target), mappings(), fast_retry(2)))
}

fn issue_json(id: u64, number: u64) -> serde_json::Value {
    json!({
        "id": id,
        "number": number,
        "title": "Panic in planner",
        "body": "B",
        "html_url": format!("https://github.com/pingcap/tidb/issues/{number}"),
        "state": "open",
        "user": { "login": "octocat", "html_url": "https://github.com/octocat" },
        "labels": [],
        "comments": 0,
        "created_at": "2019-05-01T08:00:00Z"
    })
}

fn repository_json(name: &str) -> serde_json::Value {
    json!({ "name": name, "owner": { "login": "pingcap" } })
}

fn payload(value: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
}

#[tokio::test]
async fn opened_delivery_creates_the_target_issue() {
    let target = FakeTarget::new();
    let body = payload(json!({
        "action": "opened",
        "issue": issue_json(1001, 42),
        "repository": repository_json("tidb"),
    }));

    dispatcher(&target).handle_delivery("issues", "d-1", &body).await.unwrap();

    let stored = target.issue_by_source(1001).expect("created");
    assert_eq!(stored.issue.summary, "Panic in planner");
}

#[tokio::test]
async fn labeled_delivery_routes_the_label_name() {
    let target = FakeTarget::new();
    target.seed(
        PROJECT,
        1001,
        TargetIssue {
            id: "20001".into(),
            key: "TIDB-1".into(),
            issue_type: Some("Task".into()),
            ..TargetIssue::default()
        },
    );
    let body = payload(json!({
        "action": "labeled",
        "issue": issue_json(1001, 42),
        "repository": repository_json("tidb"),
        "label": { "name": "type/bug" },
    }));

    dispatcher(&target).handle_delivery("issues", "d-2", &body).await.unwrap();

    assert_eq!(target.issue_by_source(1001).unwrap().issue.issue_type.as_deref(), Some("Bug"));
}

#[tokio::test]
async fn pull_requests_are_ignored() {
    let target = FakeTarget::new();
    let mut issue = issue_json(1001, 42);
    issue["pull_request"] = json!({ "url": "https://api.github.com/repos/pingcap/tidb/pulls/42" });
    let body = payload(json!({
        "action": "opened",
        "issue": issue,
        "repository": repository_json("tidb"),
    }));

    dispatcher(&target).handle_delivery("issues", "d-3", &body).await.unwrap();

    assert!(target.calls().is_empty());
    assert_eq!(target.searches(), 0);
}

#[tokio::test]
async fn unconfigured_repository_is_ignored() {
    let target = FakeTarget::new();
    let body = payload(json!({
        "action": "opened",
        "issue": issue_json(1001, 42),
        "repository": repository_json("website"),
    }));

    dispatcher(&target).handle_delivery("issues", "d-4", &body).await.unwrap();

    assert!(target.issues().is_empty());
}

#[tokio::test]
async fn unknown_action_is_ignored() {
    let target = FakeTarget::new();
    let body = payload(json!({
        "action": "milestoned",
        "issue": issue_json(1001, 42),
        "repository": repository_json("tidb"),
    }));

    dispatcher(&target).handle_delivery("issues", "d-5", &body).await.unwrap();

    assert!(target.calls().is_empty());
}

#[tokio::test]
async fn comment_delivery_adds_a_comment() {
    let target = FakeTarget::new();
    target.seed(PROJECT, 1001, TargetIssue { id: "20001".into(), key: "TIDB-1".into(), ..TargetIssue::default() });
    let body = payload(json!({
        "action": "created",
        "issue": issue_json(1001, 42),
        "repository": repository_json("tidb"),
        "comment": {
            "id": 900,
            "body": "looks like a planner bug",
            "html_url": "https://github.com/pingcap/tidb/issues/42#issuecomment-900",
            "user": { "login": "alice", "html_url": "https://github.com/alice" },
            "created_at": "2019-05-02T08:00:00Z"
        }
    }));

    dispatcher(&target).handle_delivery("issue_comment", "d-6", &body).await.unwrap();

    let comments = target.issue_by_source(1001).unwrap().comments;
    assert_eq!(comments.len(), 1);
    assert!(comments[0].body.starts_with("Comment [(ID 900)|"));
}

#[tokio::test]
async fn unsupported_event_type_is_reported() {
    let target = FakeTarget::new();

    let err = dispatcher(&target).handle_delivery("push", "d-7", b"{}").await.unwrap_err();

    assert!(matches!(err, SyncError::UnsupportedEvent(_)));
}
