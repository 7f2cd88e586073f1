//! Security Command Center notification configs
//!
//! A streaming notification config forwards every finding matching its
//! filter to a Pub/Sub topic. The service account SCC publishes with needs
//! `pubsub.topics.publish` on that topic; granting it is left to the
//! organization's IAM setup.

use crate::error::{ProvisionError, ResourceKind};
use crate::filter::Filter;
use crate::gcp::client::GcpClient;
use serde_json::{json, Value};

/// A created notification config as returned by the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    /// `organizations/{org}/notificationConfigs/{config_id}`
    pub name: String,
    pub description: String,
    pub pubsub_topic: String,
    pub service_account: String,
    pub filter: String,
}

impl From<&Value> for NotificationConfig {
    fn from(value: &Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string()
        };
        Self {
            name: field("name"),
            description: field("description"),
            pubsub_topic: field("pubsubTopic"),
            service_account: field("serviceAccount"),
            filter: value
                .pointer("/streamingConfig/filter")
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string(),
        }
    }
}

/// Request body for a config sending findings matching `filter` to `pubsub_topic`
pub fn notification_config_body(project_name: &str, pubsub_topic: &str, filter: &Filter) -> Value {
    json!({
        "description": format!("Notification for active findings for project {project_name}"),
        "pubsubTopic": pubsub_topic,
        "streamingConfig": {"filter": filter.to_string()},
    })
}

/// Register a streaming notification config under `organizations/{org_id}`
///
/// The filter is built by the caller so an unusable project name is
/// rejected before anything is provisioned.
pub async fn create_notification_config(
    client: &GcpClient,
    org_id: &str,
    project_name: &str,
    config_id: &str,
    pubsub_topic: &str,
    filter: &Filter,
) -> Result<NotificationConfig, ProvisionError> {
    let body = notification_config_body(project_name, pubsub_topic, filter);
    let parent = format!("organizations/{}", urlencoding::encode(org_id));
    let url = format!(
        "{}?configId={}",
        client.securitycenter_url(&format!("{parent}/notificationConfigs")),
        urlencoding::encode(config_id)
    );

    let response = client
        .post(&url, Some(&body))
        .await
        .map_err(|e| ProvisionError::from_api(ResourceKind::NotificationConfig, config_id, e))?;

    let config = NotificationConfig::from(&response);
    tracing::info!(
        name = %config.name,
        pubsub_topic = %config.pubsub_topic,
        service_account = %config.service_account,
        filter = %config.filter,
        "Created notification config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_for_plain_project() {
        let filter = Filter::project_display_name("proj1").unwrap();
        let body =
            notification_config_body("proj1", "projects/org-project/topics/proj1-topic", &filter);
        assert_eq!(
            body,
            json!({
                "description": "Notification for active findings for project proj1",
                "pubsubTopic": "projects/org-project/topics/proj1-topic",
                "streamingConfig": {"filter": "resource.project_display_name=\"proj1\""}
            })
        );
    }

    #[test]
    fn test_body_escapes_quotes() {
        let filter = Filter::project_display_name(r#"bad"name"#).unwrap();
        let body = notification_config_body(r#"bad"name"#, "projects/p/topics/t", &filter);
        assert_eq!(
            body["streamingConfig"]["filter"],
            r#"resource.project_display_name="bad\"name""#
        );
    }

    #[test]
    fn test_config_from_response() {
        let config = NotificationConfig::from(&json!({
            "name": "organizations/org1/notificationConfigs/proj1-notification",
            "pubsubTopic": "projects/org-project/topics/proj1-topic",
            "serviceAccount": "service-org-1@gcp-sa-scc-notification.iam.gserviceaccount.com",
            "streamingConfig": {"filter": "resource.project_display_name=\"proj1\""}
        }));
        assert_eq!(config.filter, "resource.project_display_name=\"proj1\"");
        assert_eq!(config.description, "-");
    }
}
