//! Error types for the provisioning flow

use crate::gcp::http;
use std::fmt;
use thiserror::Error;

/// The four kinds of resource created for a new project
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Bucket,
    Topic,
    NotificationConfig,
    DataflowJob,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bucket => "bucket",
            Self::Topic => "topic",
            Self::NotificationConfig => "notification config",
            Self::DataflowJob => "dataflow job",
        })
    }
}

/// Everything that can end a trigger invocation early
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The Pub/Sub message had no `data` field
    #[error("trigger event carries no data payload")]
    NoData,

    #[error("failed to decode trigger event payload: {0}")]
    Decode(String),

    /// A required field of the audit log entry is absent or not a string
    #[error("trigger event payload is missing field `{0}`")]
    MissingField(&'static str),

    #[error("cannot use {0:?} in a notification filter: control characters are not allowed")]
    InvalidFilterValue(String),

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: ResourceKind, name: String },

    /// The name is globally taken by a resource outside our reach
    #[error("{kind} name '{name}' is taken by another project")]
    NameUnavailable { kind: ResourceKind, name: String },

    #[error("failed to create {kind}: {source:#}")]
    Api {
        kind: ResourceKind,
        #[source]
        source: anyhow::Error,
    },
}

impl ProvisionError {
    /// Classify a failed create call for `kind` named `name`
    pub fn from_api(kind: ResourceKind, name: &str, source: anyhow::Error) -> Self {
        match http::api_error(&source) {
            Some(api) if api.is_already_exists() => Self::AlreadyExists {
                kind,
                name: name.to_string(),
            },
            _ => Self::Api { kind, source },
        }
    }

    /// Whether the error comes from the event itself rather than a cloud API
    pub fn is_bad_event(&self) -> bool {
        matches!(
            self,
            Self::NoData | Self::Decode(_) | Self::MissingField(_) | Self::InvalidFilterValue(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_message_is_stable() {
        assert_eq!(
            ProvisionError::NoData.to_string(),
            "trigger event carries no data payload"
        );
    }

    #[test]
    fn test_from_api_without_api_error_stays_generic() {
        let err = ProvisionError::from_api(
            ResourceKind::Topic,
            "proj1-topic",
            anyhow::anyhow!("connection refused"),
        );
        assert!(matches!(err, ProvisionError::Api { kind: ResourceKind::Topic, .. }));
        assert!(err.to_string().contains("connection refused"));
        assert!(!err.is_bad_event());
    }

    #[test]
    fn test_name_unavailable_display() {
        let err = ProvisionError::NameUnavailable {
            kind: ResourceKind::Bucket,
            name: "proj1".into(),
        };
        assert_eq!(err.to_string(), "bucket name 'proj1' is taken by another project");
        assert!(!err.is_bad_event());
    }

    #[test]
    fn test_already_exists_display() {
        let err = ProvisionError::AlreadyExists {
            kind: ResourceKind::NotificationConfig,
            name: "proj1-notification".into(),
        };
        assert_eq!(
            err.to_string(),
            "notification config 'proj1-notification' already exists"
        );
    }
}
