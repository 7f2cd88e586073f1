//! Trigger handler
//!
//! Entry point for one project-creation event. Decodes the message,
//! derives the resource names and runs the provisioning steps in fixed
//! order: bucket, topic, notification config, Dataflow job. The first
//! failing step ends the invocation; resources created before it stay.

use crate::config::{Config, ExistingPolicy};
use crate::error::{ProvisionError, ResourceKind};
use crate::event::{ProjectCreated, ProjectIdentifiers, PushEnvelope};
use crate::filter::Filter;
use crate::gcp::client::GcpClient;
use crate::provision;
use serde::Serialize;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Created,
    /// Already present and left untouched under [`ExistingPolicy::Skip`]
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub kind: ResourceKind,
    pub name: String,
    pub outcome: StepOutcome,
}

/// Result of a fully processed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub identifiers: ProjectIdentifiers,
    pub steps: Vec<StepReport>,
}

#[derive(Clone)]
pub struct TriggerHandler {
    client: GcpClient,
    host_project_id: String,
    org_id: Option<String>,
    on_existing: ExistingPolicy,
}

impl TriggerHandler {
    pub fn new(client: GcpClient, config: &Config) -> Self {
        Self {
            client,
            host_project_id: config.host_project().to_string(),
            org_id: config.org_id.clone(),
            on_existing: config.on_existing,
        }
    }

    /// Handle one Pub/Sub push delivery
    pub async fn handle(&self, envelope: &PushEnvelope) -> Result<ProvisionReport, ProvisionError> {
        let ctx = envelope.context();
        let timestamp = ctx
            .timestamp
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        let span = tracing::info_span!("trigger", event_id = %ctx.event_id);

        async move {
            tracing::info!(
                "Triggered by messageId {} published at {} to {}",
                ctx.event_id,
                timestamp,
                ctx.resource
            );

            let Some(data) = envelope.message.data.as_deref() else {
                return Err(ProvisionError::NoData);
            };
            let event = ProjectCreated::decode(data)?;
            self.provision(&event).await
        }
        .instrument(span)
        .await
    }

    /// Provision every resource for a decoded project-creation event
    pub async fn provision(&self, event: &ProjectCreated) -> Result<ProvisionReport, ProvisionError> {
        let ids = ProjectIdentifiers::derive(event, &self.host_project_id, self.org_id.as_deref());
        tracing::info!(
            project = %ids.project_name,
            project_number = %ids.project_number,
            org = %ids.org_id,
            "Provisioning resources for new project"
        );

        // Reject names the notification filter cannot express before creating anything
        let filter = Filter::project_display_name(&ids.project_name)?;

        let mut steps = Vec::with_capacity(4);
        let client = &self.client;

        let bucket = provision::create_bucket(client, &self.host_project_id, &ids.project_name).await;
        self.settle(ResourceKind::Bucket, &ids.project_name, bucket, &mut steps)?;

        let topic = provision::create_topic(client, &self.host_project_id, &ids.topic_id).await;
        let topic_path = self
            .settle(ResourceKind::Topic, &ids.topic_path, topic, &mut steps)?
            .unwrap_or_else(|| ids.topic_path.clone());

        let config = provision::create_notification_config(
            client,
            &ids.org_id,
            &ids.project_name,
            &ids.notification_config_id,
            &topic_path,
            &filter,
        )
        .await;
        self.settle(
            ResourceKind::NotificationConfig,
            &ids.notification_config_id,
            config,
            &mut steps,
        )?;

        let job = provision::launch_pubsub_to_gcs_job(
            client,
            &self.host_project_id,
            &ids.job_name,
            &topic_path,
            &ids.bucket_uri,
        )
        .await;
        self.settle(ResourceKind::DataflowJob, &ids.job_name, job, &mut steps)?;

        tracing::info!(project = %ids.project_name, "Provisioning complete");
        Ok(ProvisionReport {
            identifiers: ids,
            steps,
        })
    }

    /// Record a step's outcome; `Ok(None)` means the resource was skipped
    fn settle<T>(
        &self,
        kind: ResourceKind,
        name: &str,
        result: Result<T, ProvisionError>,
        steps: &mut Vec<StepReport>,
    ) -> Result<Option<T>, ProvisionError> {
        let (value, outcome) = match result {
            Ok(value) => (Some(value), StepOutcome::Created),
            Err(ProvisionError::AlreadyExists { .. }) if self.on_existing == ExistingPolicy::Skip => {
                tracing::warn!("{} '{}' already exists, skipping", kind, name);
                (None, StepOutcome::Skipped)
            }
            Err(err) => return Err(err),
        };

        steps.push(StepReport {
            kind,
            name: name.to_string(),
            outcome,
        });
        Ok(value)
    }
}
