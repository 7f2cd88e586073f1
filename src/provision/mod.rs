//! Provisioning steps
//!
//! One module per resource kind, each a thin wrapper around a single
//! create call. Failures come back as [`ProvisionError`], with HTTP 409
//! answers classified as [`ProvisionError::AlreadyExists`] so the handler
//! can apply the configured [`ExistingPolicy`](crate::config::ExistingPolicy).
//!
//! - [`bucket`] - Cloud Storage bucket
//! - [`topic`] - Pub/Sub topic
//! - [`notification`] - Security Command Center notification config
//! - [`dataflow`] - Dataflow template job

pub mod bucket;
pub mod dataflow;
pub mod notification;
pub mod topic;

pub use bucket::{create_bucket, Bucket};
pub use dataflow::{launch_pubsub_to_gcs_job, LaunchedJob};
pub use notification::{create_notification_config, NotificationConfig};
pub use topic::create_topic;
