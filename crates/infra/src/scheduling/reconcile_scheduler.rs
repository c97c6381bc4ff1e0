//! Periodic reconciliation
//!
//! Runs a [`ReconcileJob`] every `interval` until stopped. Passes never
//! overlap: the next sleep starts only after the previous pass returns.
//! Lifecycle is explicit: the loop's join handle is kept, cancellation goes
//! through a token and every await on shutdown is bounded by a timeout.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use issuesync_infra::scheduling::{ReconcileJob, ReconcileScheduler, ReconcileSchedulerConfig};
//!
//! # async fn example(job: Arc<dyn ReconcileJob>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut scheduler = ReconcileScheduler::new(
//!     job,
//!     ReconcileSchedulerConfig { interval: Duration::from_secs(3600), ..Default::default() },
//! )?;
//! scheduler.start().await?;
//! // ... serve webhooks ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use issuesync_core::{ReconcileReport, ReconciliationEngine};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// One reconciliation pass
#[async_trait]
pub trait ReconcileJob: Send + Sync {
    /// Run one pass to completion
    async fn run(&self) -> ReconcileReport;
}

#[async_trait]
impl ReconcileJob for ReconciliationEngine {
    async fn run(&self) -> ReconcileReport {
        ReconciliationEngine::run(self).await
    }
}

/// Timing of the periodic loop
#[derive(Debug, Clone)]
pub struct ReconcileSchedulerConfig {
    /// Pause between the end of one pass and the start of the next
    pub interval: Duration,
    /// Upper bound for a single pass
    pub run_timeout: Duration,
    /// How long `stop` waits for the loop to exit
    pub join_timeout: Duration,
}

impl Default for ReconcileSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            run_timeout: Duration::from_secs(3600),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Background loop running a [`ReconcileJob`] on a fixed interval
pub struct ReconcileScheduler {
    job: Arc<dyn ReconcileJob>,
    config: ReconcileSchedulerConfig,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ReconcileScheduler {
    pub fn new(job: Arc<dyn ReconcileJob>, config: ReconcileSchedulerConfig) -> SchedulerResult<Self> {
        if config.interval.is_zero() {
            return Err(SchedulerError::InvalidInterval("interval must be non-zero".into()));
        }
        Ok(Self { job, config, cancel: CancellationToken::new(), handle: None })
    }

    /// Spawn the background loop. The first pass runs one interval from now.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        // a cancelled token cannot be reset
        self.cancel = CancellationToken::new();
        self.handle = Some(tokio::spawn(Self::reconcile_loop(
            Arc::clone(&self.job),
            self.config.clone(),
            self.cancel.clone(),
        )));

        info!(interval_secs = self.config.interval.as_secs(), "Reconcile scheduler started");
        Ok(())
    }

    /// Cancel the loop and wait up to `join_timeout` for it to exit. A pass
    /// in flight is dropped at its next await point.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let handle = match self.handle.take() {
            Some(handle) if !handle.is_finished() => handle,
            _ => return Err(SchedulerError::NotRunning),
        };

        self.cancel.cancel();
        let seconds = self.config.join_timeout.as_secs();
        tokio::time::timeout(self.config.join_timeout, handle)
            .await
            .map_err(|_| SchedulerError::Timeout { seconds })?
            .map_err(|e| SchedulerError::TaskJoinFailed(e.to_string()))?;

        info!("Reconcile scheduler stopped");
        Ok(())
    }

    /// True while the background loop is alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    async fn reconcile_loop(
        job: Arc<dyn ReconcileJob>,
        config: ReconcileSchedulerConfig,
        cancel: CancellationToken,
    ) {
        let mut pass = 0u64;
        while !cancel.is_cancelled() {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(config.interval) => {}
            }

            pass += 1;
            let started = Instant::now();
            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    warn!(pass, "reconcile pass abandoned by shutdown");
                    break;
                }
                outcome = tokio::time::timeout(config.run_timeout, job.run()) => outcome,
            };
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            match outcome {
                Ok(report) => log_report(pass, elapsed_ms, &report),
                Err(_) => error!(
                    pass,
                    timeout_secs = config.run_timeout.as_secs(),
                    "Scheduled reconciliation timed out"
                ),
            }
        }
        debug!(passes = pass, "reconcile loop exited");
    }
}

fn log_report(pass: u64, elapsed_ms: u64, report: &ReconcileReport) {
    if report.is_clean() {
        info!(
            pass,
            elapsed_ms,
            issues = report.issues,
            created = report.created,
            "Scheduled reconciliation finished"
        );
        return;
    }
    let last_error = report.last_error().map(ToString::to_string).unwrap_or_default();
    error!(
        pass,
        elapsed_ms,
        failures = report.failures.len(),
        %last_error,
        "Scheduled reconciliation finished with failures"
    );
}
