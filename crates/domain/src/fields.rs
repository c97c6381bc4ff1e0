//! Target custom fields keyed by their human-readable names
//!
//! Custom field ids differ per tracker instance, so they are resolved once at
//! startup from the tracker's field list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SyncError};
use crate::types::FieldDefinition;

/// Custom fields the engine knows how to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomFieldKey {
    /// Correlation key: the source issue's immutable numeric id
    GithubId,
    GithubUrl,
    GithubNumber,
    GithubLabels,
    GithubStatus,
    GithubReporter,
    LastSyncUpdate,
}

impl CustomFieldKey {
    pub const ALL: [CustomFieldKey; 7] = [
        Self::GithubId,
        Self::GithubUrl,
        Self::GithubNumber,
        Self::GithubLabels,
        Self::GithubStatus,
        Self::GithubReporter,
        Self::LastSyncUpdate,
    ];

    /// Field name as configured on the target tracker
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::GithubId => "GitHub ID",
            Self::GithubUrl => "GitHub URL",
            Self::GithubNumber => "GitHub Number",
            Self::GithubLabels => "GitHub Labels",
            Self::GithubStatus => "GitHub Status",
            Self::GithubReporter => "GitHub Reporter",
            Self::LastSyncUpdate => "Last Issue-Sync Update",
        }
    }

    fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.display_name() == name)
    }
}

/// Resolved numeric ids of the known custom fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldIds {
    ids: HashMap<CustomFieldKey, u64>,
}

impl FieldIds {
    /// Match field definitions by name. Only the correlation field is
    /// required; the rest are kept when present.
    pub fn resolve(definitions: &[FieldDefinition]) -> Result<Self> {
        let mut ids = HashMap::new();
        for definition in definitions {
            let (Some(key), Some(custom_id)) =
                (CustomFieldKey::from_display_name(&definition.name), definition.custom_id)
            else {
                continue;
            };
            ids.insert(key, custom_id);
        }

        if !ids.contains_key(&CustomFieldKey::GithubId) {
            return Err(SyncError::Config(
                "Could not find JIRA custom field ID of 'GitHub ID' custom field; check that it is named correctly"
                    .to_string(),
            ));
        }

        Ok(Self { ids })
    }

    /// Build from known ids directly.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (CustomFieldKey, u64)>) -> Self {
        Self { ids: pairs.into_iter().collect() }
    }

    pub fn custom_id(&self, key: CustomFieldKey) -> Option<u64> {
        self.ids.get(&key).copied()
    }

    /// Payload key, e.g. `customfield_10109`
    pub fn field_id(&self, key: CustomFieldKey) -> Result<String> {
        self.require(key).map(|id| format!("customfield_{id}"))
    }

    /// Query clause id, e.g. `10109` for `cf[10109]`
    pub fn clause_id(&self, key: CustomFieldKey) -> Result<String> {
        self.require(key).map(|id| id.to_string())
    }

    fn require(&self, key: CustomFieldKey) -> Result<u64> {
        self.custom_id(key).ok_or_else(|| {
            SyncError::NotFound(format!("custom field '{}' is not configured", key.display_name()))
        })
    }
}
