//! Webhook receiver behaviour through the axum router

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use issuesync_app::webhook::{router, DeliveryHandler, RECEIVED_BODY};
use issuesync_domain::{Result, SyncError};
use tokio::sync::mpsc;
use tower::ServiceExt;

type Received = (String, String, Vec<u8>);

struct Recorder {
    tx: mpsc::UnboundedSender<Received>,
    outcome: fn() -> Result<()>,
}

#[async_trait]
impl DeliveryHandler for Recorder {
    async fn handle(&self, event_type: &str, delivery_id: &str, payload: &[u8]) -> Result<()> {
        let _ = self.tx.send((event_type.to_string(), delivery_id.to_string(), payload.to_vec()));
        (self.outcome)()
    }
}

fn app_with(outcome: fn() -> Result<()>) -> (Router, mpsc::UnboundedReceiver<Received>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (router(Arc::new(Recorder { tx, outcome })), rx)
}

fn app() -> (Router, mpsc::UnboundedReceiver<Received>) {
    app_with(|| Ok(()))
}

fn delivery(uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("X-GitHub-Event", "issues")
        .header("X-GitHub-Delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958")
        .header("content-type", "application/json")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn get_is_a_health_check() {
    let (app, mut rx) = app();

    let response =
        app.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn other_methods_are_rejected() {
    let (app, _rx) = app();

    let response = app
        .oneshot(Request::builder().method(Method::PUT).uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_text(response).await, "405 Method not allowed");
}

#[tokio::test]
async fn missing_event_header_is_a_bad_request() {
    let (app, _rx) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("X-GitHub-Delivery", "d-1")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "400 Bad Request: Missing X-GitHub-Event Header");
}

#[tokio::test]
async fn missing_delivery_header_is_a_bad_request() {
    let (app, _rx) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("X-GitHub-Event", "issues")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "400 Bad Request: Missing X-GitHub-Delivery Header");
}

#[tokio::test]
async fn form_encoded_hooks_are_refused() {
    let (app, mut rx) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("X-GitHub-Event", "issues")
        .header("X-GitHub-Delivery", "d-1")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("payload=%7B%7D"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Hook only accepts content-type: application/json"));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn accepted_delivery_is_acknowledged_and_processed() {
    let (app, mut rx) = app();
    let payload = br#"{"action":"opened"}"#;

    let request = delivery("/hooks/github").body(Body::from(payload.to_vec())).unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, RECEIVED_BODY);

    let (event_type, delivery_id, body) =
        tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(event_type, "issues");
    assert_eq!(delivery_id, "72d3162e-cc78-11e3-81ab-4c9367dc0958");
    assert_eq!(body, payload);
}

#[tokio::test]
async fn processing_failure_does_not_change_the_response() {
    let (app, mut rx) =
        app_with(|| Err(SyncError::Api { status: 500, message: "tracker down".into() }));

    let response = app.oneshot(delivery("/").body(Body::from("{}")).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().is_some());
}
