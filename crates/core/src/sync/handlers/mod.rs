//! Incremental handlers
//!
//! One operation per (entity, action) pair. Every handler except issue
//! creation first resolves the target issue through the correlation index;
//! a miss aborts the handler and is reported, it never turns into a create.

mod comments;
mod issues;

use std::sync::Arc;

use issuesync_domain::Result;
use tracing::debug;

use super::context::SyncContext;
use super::ports::TargetTracker;

pub(crate) use issues::create_target_issue;

/// Per-event state transitions driven by webhook deliveries
pub struct IncrementalHandlers {
    ctx: Arc<SyncContext>,
}

impl IncrementalHandlers {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self { ctx }
    }

    /// Shared sync context
    pub fn context(&self) -> &Arc<SyncContext> {
        &self.ctx
    }
}

/// Apply transition ids in order, stopping at the first failure
pub(crate) async fn apply_transitions(
    target: &dyn TargetTracker,
    issue_id: &str,
    transition_ids: &[String],
) -> Result<()> {
    for transition_id in transition_ids {
        target.do_transition(issue_id, transition_id).await?;
        debug!(target_issue = issue_id, transition_id = %transition_id, "transition applied");
    }
    Ok(())
}
