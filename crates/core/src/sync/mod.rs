//! Synchronization engine

pub mod context;
pub mod correlation;
pub mod dispatch;
pub mod handlers;
pub mod ports;
pub mod projection;
pub mod reconcile;
pub mod rules;
