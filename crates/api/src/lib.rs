//! # issuesync App
//!
//! Process layer - wiring and the webhook entry point.
//!
//! This crate contains:
//! - Command-line parsing and config overrides
//! - Logging bootstrap
//! - Application context (dependency injection)
//! - The axum webhook receiver
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires concrete tracker clients into the sync engine

pub mod cli;
pub mod context;
pub mod utils;
pub mod webhook;

// Re-export for convenience
pub use cli::Cli;
pub use context::AppContext;
pub use webhook::{router, DeliveryHandler};
