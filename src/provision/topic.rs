//! Pub/Sub topic creation

use crate::error::{ProvisionError, ResourceKind};
use crate::event::topic_path;
use crate::gcp::client::GcpClient;
use serde_json::json;

/// Create `projects/{project_id}/topics/{topic_id}` and return that path
pub async fn create_topic(
    client: &GcpClient,
    project_id: &str,
    topic_id: &str,
) -> Result<String, ProvisionError> {
    let path = topic_path(project_id, topic_id);
    let url = client.pubsub_url(&topic_path(
        &urlencoding::encode(project_id),
        &urlencoding::encode(topic_id),
    ));

    client
        .put(&url, Some(&json!({})))
        .await
        .map_err(|e| ProvisionError::from_api(ResourceKind::Topic, &path, e))?;

    tracing::info!("Created topic {}", path);
    Ok(path)
}
