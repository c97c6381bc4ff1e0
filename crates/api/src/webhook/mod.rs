//! Webhook receiver
//!
//! Every path is served by one handler. Health-check GETs get an empty 200,
//! malformed deliveries a plain-text 4xx, and accepted deliveries are
//! acknowledged before processing starts on a spawned task.

pub mod error;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use issuesync_core::EventDispatcher;
use issuesync_domain::{Result, SyncError};
use tracing::{debug, error, Instrument};

pub use error::WebhookError;

pub const EVENT_HEADER: &str = "x-github-event";
pub const DELIVERY_HEADER: &str = "x-github-delivery";
pub const RECEIVED_BODY: &str = "Event received. Have a nice day.";

/// Upper bound for a delivery body; the forge caps payloads at 25 MB
const MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Processes one accepted delivery
#[async_trait]
pub trait DeliveryHandler: Send + Sync + 'static {
    /// Errors are logged by the caller; the forge has already been answered
    async fn handle(&self, event_type: &str, delivery_id: &str, payload: &[u8]) -> Result<()>;
}

#[async_trait]
impl DeliveryHandler for EventDispatcher {
    async fn handle(&self, event_type: &str, delivery_id: &str, payload: &[u8]) -> Result<()> {
        self.handle_delivery(event_type, delivery_id, payload).await
    }
}

#[derive(Clone)]
struct WebhookState {
    handler: Arc<dyn DeliveryHandler>,
}

/// A delivery that passed header validation
#[derive(Debug)]
struct Delivery {
    event_type: String,
    delivery_id: String,
    payload: Bytes,
}

/// Router answering on every path: GET for health checks, POST for deliveries
pub fn router(handler: Arc<dyn DeliveryHandler>) -> Router {
    Router::new().fallback(receive).with_state(WebhookState { handler })
}

async fn receive(State(state): State<WebhookState>, request: Request) -> Response {
    let delivery = match accept(request).await {
        Ok(Some(delivery)) => delivery,
        Ok(None) => return StatusCode::OK.into_response(),
        Err(err) => {
            debug!(resp = %err, error = ?err, "rejected delivery");
            return err.into_response();
        }
    };

    debug!(event_type = %delivery.event_type, delivery_id = %delivery.delivery_id, "delivery received");
    spawn_processing(state.handler, delivery);
    (StatusCode::OK, RECEIVED_BODY).into_response()
}

/// Validate method and headers, then read the body. `None` is a health check.
async fn accept(request: Request) -> std::result::Result<Option<Delivery>, WebhookError> {
    let (parts, body) = request.into_parts();

    if parts.method == Method::GET {
        debug!(uri = %parts.uri, "health check");
        return Ok(None);
    }
    if parts.method != Method::POST {
        return Err(WebhookError::MethodNotAllowed);
    }

    let event_type =
        header_value(&parts.headers, EVENT_HEADER).ok_or(WebhookError::MissingEventType)?;
    let delivery_id =
        header_value(&parts.headers, DELIVERY_HEADER).ok_or(WebhookError::MissingDeliveryId)?;
    let content_type = header_value(&parts.headers, header::CONTENT_TYPE.as_str());
    if content_type.as_deref() != Some("application/json") {
        return Err(WebhookError::UnsupportedContentType);
    }

    let payload = read_body(body).await?;
    Ok(Some(Delivery { event_type, delivery_id, payload }))
}

async fn read_body(body: Body) -> std::result::Result<Bytes, WebhookError> {
    to_bytes(body, MAX_PAYLOAD_BYTES)
        .await
        .map_err(|e| WebhookError::UnreadableBody(e.to_string()))
}

/// Non-empty header value; missing, empty and non-ASCII values are all absent
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn spawn_processing(handler: Arc<dyn DeliveryHandler>, delivery: Delivery) {
    let span = tracing::info_span!(
        "delivery",
        event_type = %delivery.event_type,
        delivery_id = %delivery.delivery_id
    );
    tokio::spawn(
        async move {
            let outcome =
                handler.handle(&delivery.event_type, &delivery.delivery_id, &delivery.payload).await;
            match outcome {
                Ok(()) => debug!("delivery processed"),
                Err(SyncError::UnsupportedEvent(kind)) => debug!(kind = %kind, "delivery ignored"),
                Err(err) => error!(error = %err, "failed to process delivery"),
            }
        }
        .instrument(span),
    );
}
