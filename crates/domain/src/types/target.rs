//! Target (ticket tracker) model
//!
//! Adapters translate the tracker's wire format into these types; the engine
//! never sees raw tracker JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::STATUS_CATEGORY_DONE;

/// Target issue as returned by a correlation search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetIssue {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub components: Vec<String>,
    /// Target user name of the current assignee
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub status_category: Option<String>,
}

impl TargetIssue {
    pub fn is_done(&self) -> bool {
        self.status_category.as_deref() == Some(STATUS_CATEGORY_DONE)
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.components.iter().any(|c| c == name)
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.issue_type.as_deref() == Some(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetComment {
    pub id: String,
    pub body: String,
}

/// One entry of the tracker's field list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub custom_id: Option<u64>,
}

/// Full field set for creating a target issue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueProjection {
    pub project_key: String,
    pub issue_type: String,
    pub summary: String,
    pub description: String,
    pub components: Vec<String>,
    pub fix_versions: Vec<String>,
    pub affects_versions: Vec<String>,
    pub labels: Vec<String>,
    pub assignee: Option<String>,
    /// Payload key (`customfield_N`) to value
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

/// Partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueUpdate {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub issue_type: Option<String>,
    pub components: Option<Vec<String>>,
}

impl IssueUpdate {
    pub fn issue_type(name: impl Into<String>) -> Self {
        Self { issue_type: Some(name.into()), ..Self::default() }
    }

    pub fn components(names: Vec<String>) -> Self {
        Self { components: Some(names), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.description.is_none()
            && self.issue_type.is_none()
            && self.components.is_none()
    }
}
