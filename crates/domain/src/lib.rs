//! # issuesync Domain
//!
//! Business domain types for the issue synchronization engine.
//!
//! This crate contains:
//! - Source, target and webhook event types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Custom field keys and domain constants
//!
//! ## Architecture
//! - No dependencies on other issuesync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod fields;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use fields::{CustomFieldKey, FieldIds};
pub use types::*;
