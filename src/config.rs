//! Configuration Management
//!
//! Values are layered: defaults, then an optional JSON/YAML file, then
//! environment variables. The host project falls back to the ambient
//! `GOOGLE_CLOUD_PROJECT`-style variables.

use crate::gcp::auth;
use crate::gcp::client::Endpoints;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// What to do when a resource to be created is already there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingPolicy {
    /// Abort the invocation with an already-exists error
    #[default]
    Fail,
    /// Leave the existing resource alone and continue
    Skip,
}

impl FromStr for ExistingPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "skip" => Ok(Self::Skip),
            other => bail!("unknown on_existing policy '{}', expected 'fail' or 'skip'", other),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Project that owns the topics and runs the Dataflow jobs
    pub host_project_id: Option<String>,
    /// Organization for notification configs; overrides the event's parent id
    pub org_id: Option<String>,
    pub on_existing: ExistingPolicy,
    pub endpoints: Endpoints,
    /// Fixed bearer token, for emulators. ADC is used when unset.
    pub access_token: Option<String>,
}

impl Config {
    /// Default config file location
    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("scc-provisioner").join("config.json"))
    }

    /// Load configuration from `path` (or the default locations) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("SCC_PROVISIONER_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file; `.yaml`/`.yml` as YAML, anything else as JSON
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        if is_yaml {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config {}", path.display()))
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config {}", path.display()))
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(project) = std::env::var("SCC_HOST_PROJECT_ID") {
            self.host_project_id = Some(project);
        }
        if let Ok(org) = std::env::var("SCC_ORG_ID") {
            self.org_id = Some(org);
        }
        if let Ok(policy) = std::env::var("SCC_ON_EXISTING") {
            self.on_existing = policy.parse().context("Invalid SCC_ON_EXISTING")?;
        }
        if self.host_project_id.is_none() {
            self.host_project_id = auth::get_default_project();
        }
        Ok(())
    }

    /// Check required options and endpoint URLs
    pub fn validate(&self) -> Result<()> {
        let Some(project) = self.host_project_id.as_deref() else {
            bail!("No host project configured. Set host_project_id, SCC_HOST_PROJECT_ID or GOOGLE_CLOUD_PROJECT");
        };
        if !auth::validate_project_id(project) {
            bail!("Invalid host project ID '{}'", project);
        }
        if let Some(org) = self.org_id.as_deref() {
            if org.is_empty() || !org.chars().all(|c| c.is_ascii_digit()) {
                bail!("Invalid organization ID '{}', expected a numeric ID", org);
            }
        }

        for (name, base) in [
            ("storage", &self.endpoints.storage),
            ("pubsub", &self.endpoints.pubsub),
            ("securitycenter", &self.endpoints.securitycenter),
            ("dataflow", &self.endpoints.dataflow),
        ] {
            let url = url::Url::parse(base)
                .with_context(|| format!("Invalid {} endpoint '{}'", name, base))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("Invalid {} endpoint '{}': expected http or https", name, base);
            }
        }

        Ok(())
    }

    /// Host project; only call after [`Config::validate`] succeeded
    pub fn host_project(&self) -> &str {
        self.host_project_id.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            host_project_id: Some("org-project".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_accepts_defaults_with_project() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_host_project() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("No host project configured"));
    }

    #[test]
    fn test_validate_rejects_non_numeric_org() {
        let config = Config {
            org_id: Some("organizations/1".to_string()),
            ..config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = config();
        config.endpoints.dataflow = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("skip".parse::<ExistingPolicy>().unwrap(), ExistingPolicy::Skip);
        assert_eq!("FAIL".parse::<ExistingPolicy>().unwrap(), ExistingPolicy::Fail);
        assert!("retry".parse::<ExistingPolicy>().is_err());
    }

    #[test]
    fn test_from_yaml_and_json_files() {
        let dir = std::env::temp_dir().join(format!("scc-provisioner-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let yaml = dir.join("config.yaml");
        std::fs::write(
            &yaml,
            "host_project_id: org-project\non_existing: skip\nendpoints:\n  pubsub: http://localhost:8085\n",
        )
        .unwrap();
        let parsed = Config::from_file(&yaml).unwrap();
        assert_eq!(parsed.host_project(), "org-project");
        assert_eq!(parsed.on_existing, ExistingPolicy::Skip);
        assert_eq!(parsed.endpoints.pubsub, "http://localhost:8085");
        assert_eq!(parsed.endpoints.storage, "https://storage.googleapis.com");

        let json = dir.join("config.json");
        std::fs::write(&json, r#"{"host_project_id":"org-project","org_id":"1234"}"#).unwrap();
        let parsed = Config::from_file(&json).unwrap();
        assert_eq!(parsed.org_id.as_deref(), Some("1234"));
        assert_eq!(parsed.on_existing, ExistingPolicy::Fail);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
