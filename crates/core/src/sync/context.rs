//! Shared state for handlers and the reconciliation engine

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use issuesync_domain::{Config, RepositorySyncConfig};

use super::correlation::CorrelationIndex;
use super::ports::{SourceTracker, TargetTracker};
use super::projection::Projector;
use super::rules::LabelRules;

/// Static lookup tables loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct SyncMappings {
    pub repos: BTreeMap<String, RepositorySyncConfig>,
    pub fix_versions: HashMap<String, Vec<String>>,
    pub affects_versions: HashMap<String, Vec<String>>,
    /// Source login to target user name
    pub assignees: HashMap<String, String>,
}

impl SyncMappings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            repos: config.repos.clone(),
            fix_versions: config.fix_versions.clone(),
            affects_versions: config.affects_versions.clone(),
            assignees: config.assignee.clone(),
        }
    }

    /// Sync settings of a configured repository
    pub fn repo(&self, name: &str) -> Option<&RepositorySyncConfig> {
        self.repos.get(name)
    }

    /// Tracker user mapped to a forge login
    pub fn target_user(&self, login: &str) -> Option<&str> {
        self.assignees.get(login).map(String::as_str)
    }
}

/// Everything a sync operation needs, shared behind an `Arc`
pub struct SyncContext {
    pub source: Arc<dyn SourceTracker>,
    pub target: Arc<dyn TargetTracker>,
    pub mappings: SyncMappings,
    pub projector: Projector,
    pub correlation: CorrelationIndex,
    pub rules: LabelRules,
}

impl SyncContext {
    pub fn new(
        source: Arc<dyn SourceTracker>,
        target: Arc<dyn TargetTracker>,
        mappings: SyncMappings,
        projector: Projector,
        correlation: CorrelationIndex,
    ) -> Self {
        Self { source, target, mappings, projector, correlation, rules: LabelRules::standard() }
    }

    /// Replace the label rule registry
    pub fn with_rules(mut self, rules: LabelRules) -> Self {
        self.rules = rules;
        self
    }
}
