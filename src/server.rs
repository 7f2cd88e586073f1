//! Pub/Sub push endpoint
//!
//! `POST /` takes a push delivery and runs the [`TriggerHandler`] on it.
//! Pub/Sub redelivers anything not answered with 2xx.

use crate::error::ProvisionError;
use crate::event::PushEnvelope;
use crate::handler::TriggerHandler;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for ProvisionError {
    fn into_response(self) -> Response {
        let status = match &self {
            err if err.is_bad_event() => StatusCode::BAD_REQUEST,
            ProvisionError::AlreadyExists { .. } | ProvisionError::NameUnavailable { .. } => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

pub fn router(handler: TriggerHandler) -> Router {
    Router::new()
        .route("/", post(push))
        .route("/healthz", get(healthz))
        .with_state(Arc::new(handler))
}

async fn push(
    State(handler): State<Arc<TriggerHandler>>,
    Json(envelope): Json<PushEnvelope>,
) -> Result<StatusCode, ProvisionError> {
    match handler.handle(&envelope).await {
        Ok(report) => {
            tracing::info!(
                project = %report.identifiers.project_name,
                steps = report.steps.len(),
                "Event processed"
            );
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            tracing::error!(message_id = %envelope.message.message_id, "Event failed: {}", err);
            Err(err)
        }
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Serve until ctrl-c or SIGTERM
pub async fn serve(listener: tokio::net::TcpListener, handler: TriggerHandler) -> anyhow::Result<()> {
    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
