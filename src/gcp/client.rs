//! GCP Client
//!
//! Main client for interacting with GCP APIs, combining authentication
//! and HTTP functionality.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Base URLs of the REST APIs the provisioner talks to
///
/// Overridable so the client can be pointed at emulators or a mock server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub storage: String,
    pub pubsub: String,
    pub securitycenter: String,
    pub dataflow: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            storage: "https://storage.googleapis.com".to_string(),
            pubsub: "https://pubsub.googleapis.com".to_string(),
            securitycenter: "https://securitycenter.googleapis.com".to_string(),
            dataflow: "https://dataflow.googleapis.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every service at the same base URL
    pub fn all(base: &str) -> Self {
        Self {
            storage: base.to_string(),
            pubsub: base.to_string(),
            securitycenter: base.to_string(),
            dataflow: base.to_string(),
        }
    }
}

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub endpoints: Endpoints,
}

impl GcpClient {
    pub fn new(credentials: GcpCredentials, endpoints: Endpoints) -> Result<Self> {
        Ok(Self {
            credentials,
            http: GcpHttpClient::new()?,
            endpoints,
        })
    }

    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.post(url, &token, body).await
    }

    /// Make a PUT request to a GCP API
    pub async fn put(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.put(url, &token, body).await
    }

    // =========================================================================
    // Cloud Storage API helpers
    // =========================================================================

    /// Build Cloud Storage JSON API URL
    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", trim(&self.endpoints.storage), path)
    }

    // =========================================================================
    // Pub/Sub API helpers
    // =========================================================================

    /// Build Pub/Sub API URL for a resource name such as `projects/p/topics/t`
    pub fn pubsub_url(&self, resource: &str) -> String {
        format!("{}/v1/{}", trim(&self.endpoints.pubsub), resource)
    }

    // =========================================================================
    // Security Command Center API helpers
    // =========================================================================

    /// Build Security Command Center API URL
    pub fn securitycenter_url(&self, resource: &str) -> String {
        format!("{}/v1/{}", trim(&self.endpoints.securitycenter), resource)
    }

    // =========================================================================
    // Dataflow API helpers
    // =========================================================================

    /// Build regional Dataflow API URL
    pub fn dataflow_location_url(&self, project_id: &str, location: &str, path: &str) -> String {
        format!(
            "{}/v1b3/projects/{}/locations/{}/{}",
            trim(&self.endpoints.dataflow),
            project_id,
            location,
            path
        )
    }
}

fn trim(base: &str) -> &str {
    base.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GcpClient {
        GcpClient::new(GcpCredentials::from_static_token("t"), Endpoints::all(base)).unwrap()
    }

    #[test]
    fn test_default_endpoints_are_public_hosts() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.pubsub, "https://pubsub.googleapis.com");
        assert_eq!(endpoints.dataflow, "https://dataflow.googleapis.com");
    }

    #[test]
    fn test_url_builders() {
        let client = client("http://localhost:8085/");
        assert_eq!(
            client.storage_url("b?project=p"),
            "http://localhost:8085/storage/v1/b?project=p"
        );
        assert_eq!(
            client.pubsub_url("projects/p/topics/t"),
            "http://localhost:8085/v1/projects/p/topics/t"
        );
        assert_eq!(
            client.securitycenter_url("organizations/1/notificationConfigs"),
            "http://localhost:8085/v1/organizations/1/notificationConfigs"
        );
        assert_eq!(
            client.dataflow_location_url("p", "asia-southeast1", "templates:launch"),
            "http://localhost:8085/v1b3/projects/p/locations/asia-southeast1/templates:launch"
        );
    }
}
