//! Shared test helpers for `issuesync-core` integration tests.
//!
//! These helpers provide in-memory trackers and fixtures so the handler and
//! reconciliation tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod fixtures;
pub mod trackers;

use std::sync::Arc;
use std::time::Duration;

use issuesync_core::{
    CorrelationIndex, MarkdownConverter, Projector, RetryPolicy, SourceTracker, SyncContext,
    SyncMappings, TargetTracker,
};
use issuesync_domain::{CustomFieldKey, FieldIds};

pub use fixtures::*;
pub use trackers::*;

pub const GITHUB_ID_FIELD: u64 = 10109;
pub const GITHUB_URL_FIELD: u64 = 10110;

pub fn field_ids() -> FieldIds {
    FieldIds::from_pairs([
        (CustomFieldKey::GithubId, GITHUB_ID_FIELD),
        (CustomFieldKey::GithubUrl, GITHUB_URL_FIELD),
    ])
}

/// Short backoff so tests that exercise the correlation retry stay quick
pub fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempts,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

pub fn build_context(
    source: Arc<FakeSource>,
    target: Arc<FakeTarget>,
    mappings: SyncMappings,
    retry: RetryPolicy,
) -> Arc<SyncContext> {
    let converter: Arc<dyn MarkdownConverter> = Arc::new(IdentityConverter);
    let target_port: Arc<dyn TargetTracker> = target;
    let source_port: Arc<dyn SourceTracker> = source;
    let projector = Projector::new(converter, chrono_tz::Asia::Shanghai, field_ids());
    let correlation = CorrelationIndex::new(Arc::clone(&target_port), field_ids(), retry);
    Arc::new(SyncContext::new(source_port, target_port, mappings, projector, correlation))
}
