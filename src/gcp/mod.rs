//! GCP API interaction module
//!
//! Authentication, the HTTP client and per-service URL builders used by the
//! provisioning steps.
//!
//! - [`auth`] - Application Default Credentials or a static token
//! - [`client`] - Authenticated client with service endpoints
//! - [`http`] - HTTP utilities and the typed [`http::ApiError`]
//!
//! # Example
//!
//! ```ignore
//! use scc_provisioner::gcp::{auth::GcpCredentials, client::{Endpoints, GcpClient}};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new(GcpCredentials::from_adc().await?, Endpoints::default())?;
//!     client.put(&client.pubsub_url("projects/p/topics/t"), None).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
