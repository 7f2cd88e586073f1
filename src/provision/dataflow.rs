//! Dataflow template jobs
//!
//! Launches Google's "Pub/Sub to Cloud Storage Text" classic template so
//! findings published on the project's topic land as text files in the
//! project's bucket. The launch is fire-and-forget: only the HTTP answer
//! is checked, never the state of the job itself.

use crate::error::{ProvisionError, ResourceKind};
use crate::gcp::client::GcpClient;
use serde_json::{json, Value};

/// Region the job runs in
pub const DATAFLOW_REGION: &str = "asia-southeast1";

pub const PUBSUB_TO_GCS_TEMPLATE: &str =
    "gs://dataflow-templates-asia-southeast1/latest/Cloud_PubSub_to_GCS_Text";

/// Identity of a launched job, when the API reports one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchedJob {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl From<&Value> for LaunchedJob {
    fn from(value: &Value) -> Self {
        let field = |key: &str| {
            value
                .get("job")
                .and_then(|job| job.get(key))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };
        Self {
            id: field("id"),
            name: field("name"),
        }
    }
}

/// Launch request body; `bucket_uri` must end with `/`
pub fn launch_body(job_name: &str, input_topic: &str, bucket_uri: &str) -> Value {
    json!({
        "jobName": job_name,
        "environment": {
            "bypassTempDirValidation": false,
            "tempLocation": format!("{bucket_uri}temp"),
            "ipConfiguration": "WORKER_IP_UNSPECIFIED",
            "additionalExperiments": [],
        },
        "parameters": {
            "inputTopic": input_topic,
            "outputDirectory": bucket_uri,
            "outputFilenamePrefix": "output-",
            "outputFilenameSuffix": ".txt",
        },
    })
}

/// Launch the Pub/Sub to GCS text job in `project_id`
pub async fn launch_pubsub_to_gcs_job(
    client: &GcpClient,
    project_id: &str,
    job_name: &str,
    input_topic: &str,
    bucket_uri: &str,
) -> Result<LaunchedJob, ProvisionError> {
    let url = format!(
        "{}?gcsPath={}",
        client.dataflow_location_url(
            &urlencoding::encode(project_id),
            DATAFLOW_REGION,
            "templates:launch"
        ),
        urlencoding::encode(PUBSUB_TO_GCS_TEMPLATE)
    );
    let body = launch_body(job_name, input_topic, bucket_uri);

    let response = client
        .post(&url, Some(&body))
        .await
        .map_err(|e| ProvisionError::from_api(ResourceKind::DataflowJob, job_name, e))?;

    let job = LaunchedJob::from(&response);
    tracing::info!(
        "Launched dataflow job {} (id {}) reading {}",
        job.name.as_deref().unwrap_or(job_name),
        job.id.as_deref().unwrap_or("unknown"),
        input_topic
    );
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_body() {
        let body = launch_body(
            "proj1-dataflow",
            "projects/org-project/topics/proj1-topic",
            "gs://proj1/",
        );
        assert_eq!(body["jobName"], "proj1-dataflow");
        assert_eq!(body["environment"]["tempLocation"], "gs://proj1/temp");
        assert_eq!(body["environment"]["bypassTempDirValidation"], false);
        assert_eq!(body["environment"]["ipConfiguration"], "WORKER_IP_UNSPECIFIED");
        assert_eq!(body["environment"]["additionalExperiments"], json!([]));
        assert_eq!(body["parameters"]["inputTopic"], "projects/org-project/topics/proj1-topic");
        assert_eq!(body["parameters"]["outputDirectory"], "gs://proj1/");
        assert_eq!(body["parameters"]["outputFilenamePrefix"], "output-");
        assert_eq!(body["parameters"]["outputFilenameSuffix"], ".txt");
    }

    #[test]
    fn test_launched_job_tolerates_empty_response() {
        assert_eq!(LaunchedJob::from(&Value::Null), LaunchedJob::default());
        let job = LaunchedJob::from(&json!({"job": {"id": "2024-01-01_00_00_00-123", "name": "proj1-dataflow"}}));
        assert_eq!(job.id.as_deref(), Some("2024-01-01_00_00_00-123"));
    }
}
