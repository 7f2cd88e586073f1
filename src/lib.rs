//! Provisions Security Command Center notification plumbing for newly
//! created GCP projects.
//!
//! A log sink publishes project-creation audit log entries to Pub/Sub; a
//! push subscription delivers them to [`server`], and the
//! [`handler::TriggerHandler`] creates, in order:
//!
//! 1. a coldline bucket named after the project,
//! 2. a `<project>-topic` topic in the host project,
//! 3. a `<project>-notification` SCC notification config publishing the
//!    project's findings to that topic,
//! 4. a Dataflow job copying the topic's messages into the bucket.

pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod gcp;
pub mod handler;
pub mod provision;
pub mod server;

pub use config::{Config, ExistingPolicy};
pub use error::{ProvisionError, ResourceKind};
pub use handler::{ProvisionReport, StepOutcome, TriggerHandler};
