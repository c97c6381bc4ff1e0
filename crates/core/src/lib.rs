//! # issuesync Core
//!
//! Pure synchronization logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for both trackers, markdown conversion and
//!   watermark persistence
//! - Field projection, correlation and label rules
//! - Incremental event handlers and the event dispatcher
//! - The bulk reconciliation engine
//!
//! ## Architecture Principles
//! - Only depends on `issuesync-domain`
//! - No HTTP, process or filesystem code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod sync;

// Re-export specific items to avoid ambiguity
pub use sync::context::{SyncContext, SyncMappings};
pub use sync::correlation::{CorrelationIndex, RetryPolicy};
pub use sync::dispatch::EventDispatcher;
pub use sync::handlers::IncrementalHandlers;
pub use sync::ports::{MarkdownConverter, SourceTracker, TargetTracker, WatermarkStore};
pub use sync::projection::Projector;
pub use sync::reconcile::{
    ReconcileFailure, ReconcileReport, ReconcileStage, ReconciliationEngine, WindowSettings,
};
pub use sync::rules::{CategoryByLabel, ComponentByLabel, LabelRule, LabelRules};
