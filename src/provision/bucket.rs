//! Cloud Storage bucket creation

use crate::error::{ProvisionError, ResourceKind};
use crate::gcp::client::GcpClient;
use crate::gcp::http;
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Multi-region the bucket is created in
pub const BUCKET_LOCATION: &str = "ASIA";

pub const STORAGE_CLASS: &str = "COLDLINE";

/// The parts of the created bucket worth logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub name: String,
    pub location: String,
    pub storage_class: String,
}

impl From<&Value> for Bucket {
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
            location: field("location"),
            storage_class: field("storageClass"),
        }
    }
}

/// Create a coldline bucket in Asia, billed to `project_id`
pub async fn create_bucket(
    client: &GcpClient,
    project_id: &str,
    name: &str,
) -> Result<Bucket, ProvisionError> {
    let url = client.storage_url(&format!("b?project={}", urlencoding::encode(project_id)));
    let body = json!({
        "name": name,
        "location": BUCKET_LOCATION,
        "storageClass": STORAGE_CLASS,
    });

    let response = match client.post(&url, Some(&body)).await {
        Ok(response) => response,
        Err(e) => {
            return Err(match ProvisionError::from_api(ResourceKind::Bucket, name, e) {
                ProvisionError::AlreadyExists { .. } => existing_bucket(client, name).await,
                other => other,
            })
        }
    };

    let bucket = Bucket::from(&response);
    tracing::info!(
        "Created bucket {} in {} with storage class {}",
        bucket.name,
        bucket.location,
        bucket.storage_class
    );
    Ok(bucket)
}

/// Classify a 409 on bucket creation
///
/// Bucket names are global, so Cloud Storage answers 409 both for our own
/// bucket and for a name held by another project. Only a bucket we can
/// read counts as already existing.
async fn existing_bucket(client: &GcpClient, name: &str) -> ProvisionError {
    let url = client.storage_url(&format!(
        "b/{}?fields=name,projectNumber",
        urlencoding::encode(name)
    ));

    match client.get(&url).await {
        Ok(found) => {
            tracing::debug!(
                "Bucket {} already exists in project number {}",
                name,
                found.get("projectNumber").and_then(|v| v.as_str()).unwrap_or("-")
            );
            ProvisionError::AlreadyExists {
                kind: ResourceKind::Bucket,
                name: name.to_string(),
            }
        }
        Err(e) => match http::api_error(&e).map(|api| api.status) {
            Some(StatusCode::FORBIDDEN) | Some(StatusCode::NOT_FOUND) => {
                ProvisionError::NameUnavailable {
                    kind: ResourceKind::Bucket,
                    name: name.to_string(),
                }
            }
            _ => ProvisionError::Api {
                kind: ResourceKind::Bucket,
                source: e,
            },
        },
    }
}
