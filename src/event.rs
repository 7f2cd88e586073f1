//! Trigger events
//!
//! A project-creation audit log entry reaches us through a Pub/Sub log
//! sink. This module decodes the push envelope, pulls the identifying
//! fields out of the audit log entry, and derives every resource name the
//! provisioning steps use.

use crate::error::ProvisionError;
use base64::{prelude::BASE64_STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Body of a Pub/Sub push delivery
#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    pub message: PubsubMessage,
    #[serde(default)]
    pub subscription: String,
}

/// Pub/Sub also sends `message_id`/`publish_time` duplicates; they are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubsubMessage {
    /// Base64-encoded JSON audit log entry
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub publish_time: Option<DateTime<Utc>>,
}

/// Metadata about the delivery, logged for every invocation
#[derive(Debug, Clone)]
pub struct EventContext {
    pub event_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub resource: String,
}

impl PushEnvelope {
    /// Delivery metadata; a random id stands in for a missing `messageId`
    pub fn context(&self) -> EventContext {
        let event_id = if self.message.message_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            self.message.message_id.clone()
        };
        EventContext {
            event_id,
            timestamp: self.message.publish_time,
            resource: self.subscription.clone(),
        }
    }
}

const PROJECT_ID: &str = "/protoPayload/request/project/projectId";
const PROJECT_NUMBER: &str = "/protoPayload/request/project/projectNumber";
const PARENT_ID: &str = "/protoPayload/request/project/parent/id";

/// The fields of a project-creation audit log entry we act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCreated {
    pub project_id: String,
    pub project_number: String,
    pub parent_id: String,
}

impl ProjectCreated {
    /// Decode the base64 `data` of a Pub/Sub message
    pub fn decode(data: &str) -> Result<Self, ProvisionError> {
        let bytes = BASE64_STANDARD
            .decode(data.trim())
            .map_err(|e| ProvisionError::Decode(format!("invalid base64: {e}")))?;
        let entry: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ProvisionError::Decode(format!("invalid JSON: {e}")))?;
        Self::from_log_entry(&entry)
    }

    pub fn from_log_entry(entry: &Value) -> Result<Self, ProvisionError> {
        Ok(Self {
            project_id: required(entry, PROJECT_ID)?,
            project_number: required(entry, PROJECT_NUMBER)?,
            parent_id: required(entry, PARENT_ID)?,
        })
    }
}

/// String at `pointer`; numbers are accepted and rendered in decimal
fn required(entry: &Value, pointer: &'static str) -> Result<String, ProvisionError> {
    match entry.pointer(pointer) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ProvisionError::MissingField(dotted(pointer))),
    }
}

fn dotted(pointer: &'static str) -> &'static str {
    match pointer {
        PROJECT_ID => "protoPayload.request.project.projectId",
        PROJECT_NUMBER => "protoPayload.request.project.projectNumber",
        PARENT_ID => "protoPayload.request.project.parent.id",
        other => other,
    }
}

/// Names of everything provisioned for one project
///
/// A pure function of the event and the host configuration, so the same
/// project always maps to the same names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectIdentifiers {
    pub project_name: String,
    pub project_number: String,
    pub org_id: String,
    pub notification_config_id: String,
    pub topic_id: String,
    pub topic_path: String,
    pub bucket_uri: String,
    pub job_name: String,
}

impl ProjectIdentifiers {
    /// `org_override` replaces the event's parent id when set
    pub fn derive(event: &ProjectCreated, host_project_id: &str, org_override: Option<&str>) -> Self {
        let project_name = event.project_id.clone();
        let topic_id = format!("{project_name}-topic");

        Self {
            project_number: event.project_number.clone(),
            org_id: org_override.unwrap_or(&event.parent_id).to_string(),
            notification_config_id: format!("{project_name}-notification"),
            topic_path: topic_path(host_project_id, &topic_id),
            bucket_uri: format!("gs://{project_name}/"),
            job_name: format!("{project_name}-dataflow"),
            topic_id,
            project_name,
        }
    }
}

/// Fully-qualified Pub/Sub topic name
pub fn topic_path(project_id: &str, topic_id: &str) -> String {
    format!("projects/{project_id}/topics/{topic_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encoded(value: &Value) -> String {
        BASE64_STANDARD.encode(value.to_string())
    }

    fn entry() -> Value {
        json!({
            "protoPayload": {
                "methodName": "CreateProject",
                "request": {
                    "project": {
                        "projectId": "proj1",
                        "projectNumber": "123",
                        "parent": {"type": "organization", "id": "org1"}
                    }
                }
            }
        })
    }

    #[test]
    fn test_decode_project_created() {
        let event = ProjectCreated::decode(&encoded(&entry())).unwrap();
        assert_eq!(
            event,
            ProjectCreated {
                project_id: "proj1".into(),
                project_number: "123".into(),
                parent_id: "org1".into(),
            }
        );
    }

    #[test]
    fn test_numeric_project_number_accepted() {
        let mut value = entry();
        value["protoPayload"]["request"]["project"]["projectNumber"] = json!(123);
        let event = ProjectCreated::from_log_entry(&value).unwrap();
        assert_eq!(event.project_number, "123");
    }

    #[test]
    fn test_missing_parent_reports_field_path() {
        let mut value = entry();
        value["protoPayload"]["request"]["project"]
            .as_object_mut()
            .unwrap()
            .remove("parent");
        let err = ProjectCreated::from_log_entry(&value).unwrap_err();
        assert_eq!(
            err.to_string(),
            "trigger event payload is missing field `protoPayload.request.project.parent.id`"
        );
    }

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let err = ProjectCreated::decode("not base64!!").unwrap_err();
        assert!(matches!(err, ProvisionError::Decode(_)));
    }

    #[test]
    fn test_non_json_payload_is_decode_error() {
        let err = ProjectCreated::decode(&BASE64_STANDARD.encode("hello")).unwrap_err();
        assert!(matches!(err, ProvisionError::Decode(ref m) if m.starts_with("invalid JSON")));
    }

    #[test]
    fn test_derive_identifiers() {
        let event = ProjectCreated::from_log_entry(&entry()).unwrap();
        let ids = ProjectIdentifiers::derive(&event, "org-project", None);

        assert_eq!(ids.project_name, "proj1");
        assert_eq!(ids.project_number, "123");
        assert_eq!(ids.org_id, "org1");
        assert_eq!(ids.notification_config_id, "proj1-notification");
        assert_eq!(ids.topic_id, "proj1-topic");
        assert_eq!(ids.topic_path, "projects/org-project/topics/proj1-topic");
        assert_eq!(ids.bucket_uri, "gs://proj1/");
        assert_eq!(ids.job_name, "proj1-dataflow");
    }

    #[test]
    fn test_org_override_wins() {
        let event = ProjectCreated::from_log_entry(&entry()).unwrap();
        let ids = ProjectIdentifiers::derive(&event, "org-project", Some("999"));
        assert_eq!(ids.org_id, "999");
    }

    #[test]
    fn test_push_envelope_without_data() {
        let envelope: PushEnvelope = serde_json::from_value(json!({
            "message": {
                "messageId": "42",
                "publishTime": "2024-03-01T10:00:00.123Z",
                "attributes": {"logging.googleapis.com/timestamp": "2024-03-01T10:00:00Z"}
            },
            "subscription": "projects/org-project/subscriptions/project-created"
        }))
        .unwrap();

        assert!(envelope.message.data.is_none());
        let ctx = envelope.context();
        assert_eq!(ctx.event_id, "42");
        assert!(ctx.timestamp.is_some());
        assert_eq!(ctx.resource, "projects/org-project/subscriptions/project-created");
    }

    #[test]
    fn test_missing_message_id_gets_generated_id() {
        let envelope: PushEnvelope = serde_json::from_value(json!({"message": {}})).unwrap();
        let ctx = envelope.context();
        assert!(uuid::Uuid::parse_str(&ctx.event_id).is_ok());
        assert!(ctx.timestamp.is_none());
    }
}
