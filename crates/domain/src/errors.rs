//! Error types used throughout the synchronization engine

use thiserror::Error;

/// Main error type for issuesync
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The remote tracker rejected a request as invalid (HTTP 400). The body
    /// is kept verbatim so callers can match known rejection signatures.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A correlation query returned more than one target issue.
    #[error("Ambiguous correlation: {matches} issues match '{query}'")]
    AmbiguousCorrelation { query: String, matches: usize },

    #[error("Unsupported event type: {0}")]
    UnsupportedEvent(String),

    #[error("Markdown conversion failed: {0}")]
    Conversion(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Several independent steps failed; each is kept in order.
    #[error("{} operations failed: {}", .0.len(), join_messages(.0))]
    Aggregate(Vec<SyncError>),
}

impl SyncError {
    /// True when the error is an expected lookup miss rather than a failure
    /// of the transport or the remote service.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Collapse a list of failures: none is `Ok`, one is returned as-is and
    /// several become [`SyncError::Aggregate`].
    pub fn aggregate(mut errors: Vec<SyncError>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Aggregate(errors)),
        }
    }
}

fn join_messages(errors: &[SyncError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Result type alias for issuesync operations
pub type Result<T> = std::result::Result<T, SyncError>;
