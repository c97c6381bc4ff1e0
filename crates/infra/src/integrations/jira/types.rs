//! Wire types for the tracker's REST API

use issuesync_domain::{FieldDefinition, IssueProjection, IssueUpdate, TargetComment, TargetIssue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields requested on correlation searches
pub const SEARCH_FIELDS: &str = "summary,issuetype,components,assignee,status";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Named {
    pub name: String,
}

impl Named {
    fn list(names: &[String]) -> Vec<Named> {
        names.iter().map(|name| Named { name: name.clone() }).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<WireIssue>,
}

#[derive(Debug, Deserialize)]
pub struct WireIssue {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub fields: WireIssueFields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireIssueFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub issuetype: Option<Named>,
    #[serde(default)]
    pub components: Vec<Named>,
    #[serde(default)]
    pub assignee: Option<Named>,
    #[serde(default)]
    pub status: Option<WireStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStatus {
    #[serde(default)]
    pub status_category: Option<Named>,
}

impl From<WireIssue> for TargetIssue {
    fn from(wire: WireIssue) -> Self {
        let fields = wire.fields;
        TargetIssue {
            id: wire.id,
            key: wire.key,
            summary: fields.summary,
            issue_type: fields.issuetype.map(|t| t.name),
            components: fields.components.into_iter().map(|c| c.name).collect(),
            assignee: fields.assignee.map(|a| a.name),
            status_category: fields.status.and_then(|s| s.status_category).map(|c| c.name),
        }
    }
}

/// `{"id": ..., "key": ...}` returned by issue creation
#[derive(Debug, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct FieldsPayload {
    pub fields: Map<String, Value>,
}

fn named(name: &str) -> Value {
    serde_json::json!({ "name": name })
}

fn named_list(names: &[String]) -> Value {
    serde_json::to_value(Named::list(names)).unwrap_or(Value::Array(Vec::new()))
}

impl From<&IssueProjection> for FieldsPayload {
    fn from(projection: &IssueProjection) -> Self {
        let mut fields = Map::new();
        fields.insert("project".into(), serde_json::json!({ "key": projection.project_key }));
        fields.insert("issuetype".into(), named(&projection.issue_type));
        fields.insert("summary".into(), Value::from(projection.summary.clone()));
        fields.insert("description".into(), Value::from(projection.description.clone()));
        fields.insert("components".into(), named_list(&projection.components));
        fields.insert("labels".into(), Value::from(projection.labels.clone()));
        if !projection.fix_versions.is_empty() {
            fields.insert("fixVersions".into(), named_list(&projection.fix_versions));
        }
        if !projection.affects_versions.is_empty() {
            fields.insert("versions".into(), named_list(&projection.affects_versions));
        }
        if let Some(assignee) = &projection.assignee {
            fields.insert("assignee".into(), named(assignee));
        }
        for (key, value) in &projection.custom_fields {
            fields.insert(key.clone(), value.clone());
        }
        Self { fields }
    }
}

impl From<&IssueUpdate> for FieldsPayload {
    fn from(update: &IssueUpdate) -> Self {
        let mut fields = Map::new();
        if let Some(summary) = &update.summary {
            fields.insert("summary".into(), Value::from(summary.clone()));
        }
        if let Some(description) = &update.description {
            fields.insert("description".into(), Value::from(description.clone()));
        }
        if let Some(issue_type) = &update.issue_type {
            fields.insert("issuetype".into(), named(issue_type));
        }
        if let Some(components) = &update.components {
            fields.insert("components".into(), named_list(components));
        }
        Self { fields }
    }
}

#[derive(Debug, Serialize)]
pub struct AssigneePayload<'a> {
    pub name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct TransitionPayload<'a> {
    pub transition: TransitionRef<'a>,
}

#[derive(Debug, Serialize)]
pub struct TransitionRef<'a> {
    pub id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CommentPayload<'a> {
    pub body: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub comments: Vec<WireComment>,
}

#[derive(Debug, Deserialize)]
pub struct WireComment {
    pub id: String,
    #[serde(default)]
    pub body: String,
}

impl From<WireComment> for TargetComment {
    fn from(wire: WireComment) -> Self {
        TargetComment { id: wire.id, body: wire.body }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireField {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub schema: Option<WireFieldSchema>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFieldSchema {
    #[serde(default)]
    pub custom_id: Option<u64>,
}

impl From<WireField> for FieldDefinition {
    fn from(wire: WireField) -> Self {
        FieldDefinition {
            id: wire.id,
            name: wire.name,
            custom: wire.custom,
            custom_id: wire.schema.and_then(|s| s.custom_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_issue_reads_status_category() {
        let wire: WireIssue = serde_json::from_value(serde_json::json!({
            "id": "10001",
            "key": "TIDB-7",
            "fields": {
                "summary": "Panic",
                "issuetype": { "name": "Bug" },
                "components": [{ "name": "planner" }],
                "assignee": null,
                "status": { "name": "Closed", "statusCategory": { "key": "done", "name": "Done" } }
            }
        }))
        .unwrap();

        let issue = TargetIssue::from(wire);
        assert_eq!(issue.key, "TIDB-7");
        assert!(issue.is_done());
        assert!(issue.is_type("Bug"));
        assert_eq!(issue.assignee, None);
    }

    #[test]
    fn projection_payload_names_every_field() {
        let mut projection = IssueProjection {
            project_key: "TIDB".into(),
            issue_type: "Task".into(),
            summary: "T".into(),
            description: "D".into(),
            components: vec!["sql".into()],
            fix_versions: vec!["4.0".into()],
            labels: vec!["github".into()],
            assignee: Some("alice.jira".into()),
            ..IssueProjection::default()
        };
        projection.custom_fields.insert("customfield_10109".into(), Value::from(42u64));

        let payload = serde_json::to_value(FieldsPayload::from(&projection)).unwrap();
        let fields = &payload["fields"];
        assert_eq!(fields["project"]["key"], "TIDB");
        assert_eq!(fields["issuetype"]["name"], "Task");
        assert_eq!(fields["components"][0]["name"], "sql");
        assert_eq!(fields["fixVersions"][0]["name"], "4.0");
        assert!(fields.get("versions").is_none());
        assert_eq!(fields["assignee"]["name"], "alice.jira");
        assert_eq!(fields["customfield_10109"], 42);
    }

    #[test]
    fn update_payload_only_carries_set_fields() {
        let payload = serde_json::to_value(FieldsPayload::from(&IssueUpdate::issue_type("Bug"))).unwrap();
        assert_eq!(payload, serde_json::json!({ "fields": { "issuetype": { "name": "Bug" } } }));
    }

    #[test]
    fn cleared_assignee_serializes_null_name() {
        let payload = serde_json::to_value(AssigneePayload { name: None }).unwrap();
        assert_eq!(payload, serde_json::json!({ "name": null }));
    }
}
