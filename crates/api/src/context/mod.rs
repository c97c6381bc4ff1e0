//! Application context - dependency injection container

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use issuesync_core::{
    CorrelationIndex, EventDispatcher, Projector, ReconcileReport, ReconciliationEngine,
    RetryPolicy, SourceTracker, SyncContext, SyncMappings, TargetTracker, WindowSettings,
};
use issuesync_domain::{Config, FieldIds, Result};
use issuesync_infra::scheduling::{ReconcileScheduler, ReconcileSchedulerConfig};
use issuesync_infra::{converter_from_config, FileWatermarkStore, GithubClient, JiraClient};
use tracing::{debug, error, info};

use crate::webhook::{self, DeliveryHandler};

/// Application context - holds the sync engine and its entry points
pub struct AppContext {
    pub config: Config,
    pub sync: Arc<SyncContext>,
    pub dispatcher: Arc<EventDispatcher>,
    pub engine: Arc<ReconciliationEngine>,
}

impl AppContext {
    /// Build the context with REST clients for both trackers
    pub async fn new(config: Config) -> Result<Self> {
        let source: Arc<dyn SourceTracker> = Arc::new(GithubClient::from_config(&config.github)?);
        let target: Arc<dyn TargetTracker> = Arc::new(JiraClient::from_config(&config.jira)?);
        Self::with_trackers(config, source, target).await
    }

    /// Build the context around the given trackers. Resolves the custom
    /// field ids up front; a target without the "GitHub ID" field is fatal.
    pub async fn with_trackers(
        config: Config,
        source: Arc<dyn SourceTracker>,
        target: Arc<dyn TargetTracker>,
    ) -> Result<Self> {
        debug!("start get JIRA custom fields");
        let field_ids = FieldIds::resolve(&target.list_fields().await?)?;
        debug!("finish get JIRA custom fields");

        let projector = Projector::new(
            converter_from_config(&config.markdown),
            config.timezone()?,
            field_ids.clone(),
        );
        let correlation = CorrelationIndex::new(
            Arc::clone(&target),
            field_ids,
            RetryPolicy::from_settings(&config.sync),
        );
        let sync = Arc::new(SyncContext::new(
            source,
            target,
            SyncMappings::from_config(&config),
            projector,
            correlation,
        ));

        let engine = Arc::new(ReconciliationEngine::new(
            Arc::clone(&sync),
            Arc::new(FileWatermarkStore::new(config.watermark_path.clone())),
            WindowSettings { use_watermark: config.use_watermark, since: config.github_sincetime },
            config.sync.issue_concurrency,
        ));
        let dispatcher = Arc::new(EventDispatcher::new(Arc::clone(&sync)));

        info!(repos = config.repos.len(), "application context ready");
        Ok(Self { config, sync, dispatcher, engine })
    }

    /// Webhook router backed by this context's dispatcher
    pub fn router(&self) -> Router {
        let handler: Arc<dyn DeliveryHandler> = self.dispatcher.clone();
        webhook::router(handler)
    }

    /// One reconciliation pass before the server starts listening. Failures
    /// are logged; the report is returned for the caller to inspect.
    pub async fn presync(&self) -> ReconcileReport {
        let started = Instant::now();
        info!("start compare and sync issues from GitHub to JIRA");
        let report = self.engine.run().await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match report.last_error() {
            None => info!(elapsed_ms, issues = report.issues, "success compare and sync issues"),
            Some(err) => error!(
                elapsed_ms,
                failures = report.failures.len(),
                error = %err,
                "compare sync issues finished with failures"
            ),
        }
        report
    }

    /// Start periodic reconciliation when an interval is configured
    pub async fn start_scheduler(&self) -> Result<Option<ReconcileScheduler>> {
        if self.config.reconcile_interval_secs == 0 {
            debug!("periodic reconciliation disabled");
            return Ok(None);
        }

        let interval = Duration::from_secs(self.config.reconcile_interval_secs);
        let config = ReconcileSchedulerConfig {
            interval,
            run_timeout: interval.max(ReconcileSchedulerConfig::default().run_timeout),
            ..ReconcileSchedulerConfig::default()
        };
        let mut scheduler = ReconcileScheduler::new(self.engine.clone(), config)?;
        scheduler.start().await?;
        Ok(Some(scheduler))
    }
}
