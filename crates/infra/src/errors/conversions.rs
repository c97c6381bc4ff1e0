//! Mapping of transport, file and parser failures onto `SyncError`.

use issuesync_domain::SyncError;
use reqwest::Error as HttpError;

/// Carrier for `SyncError` so the foreign `From` impls can live in this crate.
#[derive(Debug)]
pub struct InfraError(pub SyncError);

impl From<InfraError> for SyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SyncError> for InfraError {
    fn from(value: SyncError) -> Self {
        InfraError(value)
    }
}

trait IntoSyncError {
    fn into_sync(self) -> SyncError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for HttpError {
    fn into_sync(self) -> SyncError {
        if let Some(status) = self.status() {
            let reason = status.canonical_reason().unwrap_or("unknown status");
            let message = format!("HTTP {} {reason}", status.as_u16());
            return match status.as_u16() {
                400 => SyncError::Validation(message),
                401 | 403 => SyncError::Auth(message),
                404 => SyncError::NotFound(message),
                code => SyncError::Api { status: code, message },
            };
        }

        if self.is_decode() {
            SyncError::InvalidInput(format!("undecodable tracker response: {self}"))
        } else if self.is_timeout() {
            SyncError::Network(format!("tracker timed out: {self}"))
        } else if self.is_connect() {
            SyncError::Network(format!("cannot reach tracker: {self}"))
        } else {
            SyncError::Network(self.to_string())
        }
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_sync())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for std::io::Error {
    fn into_sync(self) -> SyncError {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::NotFound => SyncError::NotFound(self.to_string()),
            ErrorKind::PermissionDenied => {
                SyncError::Config(format!("permission denied: {self}"))
            }
            ErrorKind::TimedOut => SyncError::Network(format!("I/O timed out: {self}")),
            _ => SyncError::Internal(format!("I/O error: {self}")),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_sync())
    }
}

/* -------------------------------------------------------------------------- */
/* serde / toml → SyncError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(SyncError::InvalidInput(format!("invalid JSON: {value}")))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(SyncError::Config(format!("invalid TOML: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
