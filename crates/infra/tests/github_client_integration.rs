//! Integration tests for the forge REST client against a mock server
//!
//! **Coverage:**
//! - Query parameters of issue listings
//! - `Link` header pagination
//! - Pull requests filtered out of issue listings
//! - Comment listings and error mapping

use chrono::{TimeZone, Utc};
use issuesync_core::SourceTracker;
use issuesync_domain::{GithubConfig, SyncError};
use issuesync_infra::GithubClient;
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn issue(id: u64, number: u64) -> serde_json::Value {
    json!({
        "id": id,
        "number": number,
        "title": format!("issue {number}"),
        "body": "B",
        "html_url": format!("https://github.com/pingcap/tidb/issues/{number}"),
        "state": "open",
        "user": { "login": "octocat", "html_url": "https://github.com/octocat" },
        "labels": [{ "name": "type/bug" }],
        "comments": 0,
        "created_at": "2019-05-01T08:00:00Z"
    })
}

fn client(server: &MockServer) -> GithubClient {
    GithubClient::from_config(&GithubConfig {
        base_url: server.uri(),
        username: String::new(),
        password: String::new(),
    })
    .unwrap()
}

#[tokio::test]
async fn lists_every_page_and_drops_pull_requests() {
    let server = MockServer::start().await;
    let mut pull = issue(3, 3);
    pull["pull_request"] = json!({ "url": "https://api.github.com/repos/pingcap/tidb/pulls/3" });

    Mock::given(method("GET"))
        .and(path("/repos/pingcap/tidb/issues"))
        .and(query_param("state", "all"))
        .and(query_param("since", "2020-02-29T00:00:00Z"))
        .and(query_param("sort", "created"))
        .and(query_param("direction", "asc"))
        .and(query_param("per_page", "100"))
        .and(query_param_is_missing("page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "link",
                    format!(
                        "<{}/repos/pingcap/tidb/issues?page=2>; rel=\"next\", <{}/repos/pingcap/tidb/issues?page=2>; rel=\"last\"",
                        server.uri(),
                        server.uri()
                    )
                    .as_str(),
                )
                .set_body_json(json!([issue(1, 1), pull])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/pingcap/tidb/issues"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue(2, 2)])))
        .expect(1)
        .mount(&server)
        .await;

    let since = Utc.with_ymd_and_hms(2020, 2, 29, 0, 0, 0).unwrap();
    let issues = client(&server).list_issues("pingcap", "tidb", since).await.unwrap();

    let numbers: Vec<u64> = issues.iter().map(|i| i.number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(issues[0].label_names().collect::<Vec<_>>(), ["type/bug"]);
}

#[tokio::test]
async fn lists_issue_comments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/pingcap/tidb/issues/42/comments"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 900,
            "body": "looks like a planner bug",
            "html_url": "https://github.com/pingcap/tidb/issues/42#issuecomment-900",
            "user": { "login": "alice" },
            "created_at": "2019-05-02T08:00:00Z"
        }])))
        .mount(&server)
        .await;

    let since = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
    let comments = client(&server).list_comments("pingcap", "tidb", 42, since).await.unwrap();

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, 900);
    assert_eq!(comments[0].user.login, "alice");
}

#[tokio::test]
async fn unknown_repository_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
        .mount(&server)
        .await;

    let err = client(&server).list_issues("pingcap", "missing", Utc::now()).await.unwrap_err();

    assert!(matches!(err, SyncError::NotFound(msg) if msg.contains("Not Found")));
}

#[tokio::test]
async fn bad_credentials_are_auth_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"message":"Bad credentials"}"#))
        .mount(&server)
        .await;

    let err = client(&server).list_issues("pingcap", "tidb", Utc::now()).await.unwrap_err();

    assert!(matches!(err, SyncError::Auth(_)));
}
