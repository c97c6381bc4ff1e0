//! # issuesync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - HTTP client with retry and basic auth
//! - The code forge (source) and ticket tracker (target) REST clients
//! - The external markdown converter
//! - File-backed watermark storage
//! - Configuration loading
//! - The periodic reconciliation scheduler
//!
//! ## Architecture
//! - Implements traits defined in `issuesync-core`
//! - Contains all "impure" code (network, processes, filesystem)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod markdown;
pub mod scheduling;
pub mod watermark;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::github::GithubClient;
pub use integrations::jira::JiraClient;
pub use markdown::{converter_from_config, CommandMarkdownConverter, PassthroughConverter};
pub use watermark::FileWatermarkStore;
