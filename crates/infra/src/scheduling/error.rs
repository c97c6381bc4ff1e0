//! Scheduler error types

use issuesync_domain::SyncError;
use thiserror::Error;

use crate::errors::InfraError;

/// Lifecycle and runtime failures of the reconcile scheduler
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("reconcile scheduler is already running")]
    AlreadyRunning,

    #[error("reconcile scheduler is not running")]
    NotRunning,

    /// A zero interval would spin
    #[error("invalid reconcile interval: {0}")]
    InvalidInterval(String),

    #[error("reconcile loop did not exit within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("reconcile loop panicked or was aborted: {0}")]
    TaskJoinFailed(String),
}

impl SchedulerError {
    /// Misuse of the lifecycle API rather than a runtime failure
    fn is_usage(&self) -> bool {
        matches!(self, Self::AlreadyRunning | Self::NotRunning | Self::InvalidInterval(_))
    }
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let message = err.to_string();
        InfraError(if err.is_usage() {
            SyncError::InvalidInput(message)
        } else {
            SyncError::Internal(message)
        })
    }
}

impl From<SchedulerError> for SyncError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
