//! Ticket tracker integration (REST API v2)
//!
//! Requests use HTTP basic auth. Non-success responses map onto domain
//! errors by status: 400 becomes `Validation` with the response body kept
//! intact, 401/403 `Auth`, 404 `NotFound` and everything else `Api`.

pub mod client;
pub mod types;

pub use client::JiraClient;
