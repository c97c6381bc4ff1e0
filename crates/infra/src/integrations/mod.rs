//! External service integrations

pub mod github;
pub mod jira;
