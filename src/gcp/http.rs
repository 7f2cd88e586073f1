//! HTTP utilities for GCP REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Maximum length of the Google error message kept on [`ApiError`]
const MAX_ERROR_MESSAGE_LENGTH: usize = 300;

/// Truncate long bodies and drop non-printable characters before logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = floor_char_boundary(body, MAX_LOG_BODY_LENGTH);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// A non-2xx answer from a Google API
///
/// `status_text` is the canonical code from the error body
/// (`ALREADY_EXISTS`, `PERMISSION_DENIED`, ...) when the API sends one.
#[derive(Debug, thiserror::Error)]
#[error("API request failed: {status}{}: {message}", .status_text.as_deref().map(|s| format!(" ({s})")).unwrap_or_default())]
pub struct ApiError {
    pub status: StatusCode,
    pub status_text: Option<String>,
    pub message: String,
}

impl ApiError {
    fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let error = parsed.as_ref().and_then(|v| v.get("error"));

        let status_text = error
            .and_then(|e| e.get("status"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let message = error
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error"))
            .chars()
            .filter(|c| !c.is_control())
            .take(MAX_ERROR_MESSAGE_LENGTH)
            .collect();

        Self {
            status,
            status_text,
            message,
        }
    }

    /// Whether the API refused a create because the resource is already there
    pub fn is_already_exists(&self) -> bool {
        self.status == StatusCode::CONFLICT
            || self.status_text.as_deref() == Some("ALREADY_EXISTS")
    }
}

/// Find the [`ApiError`] at the root of an error chain, if any
pub fn api_error(error: &anyhow::Error) -> Option<&ApiError> {
    error.chain().find_map(|e| e.downcast_ref::<ApiError>())
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("scc-provisioner/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        self.send(Method::GET, url, token, None).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str, token: &str, body: Option<&Value>) -> Result<Value> {
        self.send(Method::POST, url, token, body).await
    }

    /// Make a PUT request to a GCP API
    pub async fn put(&self, url: &str, token: &str, body: Option<&Value>) -> Result<Value> {
        self.send(Method::PUT, url, token, body).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(ApiError::from_response(status, &response_body).into());
        }

        if response_body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response_body).context("Failed to parse response JSON")
    }
}
