//! Rejections returned to the forge

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Why a delivery was refused. The display text is the plain-text response
/// body the forge shows in its delivery log.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("405 Method not allowed")]
    MethodNotAllowed,

    #[error("400 Bad Request: Missing X-GitHub-Event Header")]
    MissingEventType,

    #[error("400 Bad Request: Missing X-GitHub-Delivery Header")]
    MissingDeliveryId,

    #[error(
        "400 Bad Request: Hook only accepts content-type: application/json - please reConfigure this hook on GitHub"
    )]
    UnsupportedContentType,

    #[error("500 Internal Server Error: Failed to read request body")]
    UnreadableBody(String),
}

impl WebhookError {
    /// Status sent back to the forge
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingEventType | Self::MissingDeliveryId | Self::UnsupportedContentType => {
                StatusCode::BAD_REQUEST
            }
            Self::UnreadableBody(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
