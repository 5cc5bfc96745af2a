//! Service banner and health check endpoints.
//!
//! These endpoints are used by load balancers and orchestration systems
//! to determine if the service is healthy and ready to receive traffic.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

const SERVICE_NAME: &str = "pitchhub-api";

/// Service banner.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct BannerResponse {
    pub message: String,
    pub status: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status: "healthy", "ok" or "degraded".
    pub status: String,

    /// Service name.
    pub service: String,

    /// Service version.
    pub version: String,

    /// Current timestamp (ISO 8601).
    pub timestamp: String,

    /// Detailed component health (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<ComponentHealth>,
}

/// Component health details.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ComponentHealth {
    /// Entity store status.
    pub store: ComponentStatus,
}

/// Individual component status.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ComponentStatus {
    /// Status: "ok" or "unavailable".
    pub status: String,

    /// Optional message with details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Create banner and health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/livez", get(livez))
}

async fn banner() -> impl IntoResponse {
    Json(BannerResponse {
        message: "Offline Event Management API".to_string(),
        status: "running".to_string(),
    })
}

fn health_response(status: &str, components: Option<ComponentHealth>) -> HealthResponse {
    HealthResponse {
        status: status.to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        components,
    }
}

/// Basic liveness check, reported as `healthy`.
async fn health() -> impl IntoResponse {
    Json(health_response("healthy", None))
}

/// Basic health check - is the service running?
///
/// Does not check dependencies.
async fn healthz() -> impl IntoResponse {
    Json(health_response("ok", None))
}

/// Readiness check - can the entity store be reached?
///
/// Returns 503 if not.
async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let store_result = state.store().ping().await;
    let store_ok = store_result.is_ok();

    if let Err(e) = &store_result {
        tracing::warn!(error = %e, "Readiness check failed");
    }

    let components = ComponentHealth {
        store: ComponentStatus {
            status: if store_ok { "ok" } else { "unavailable" }.to_string(),
            message: store_result.err().map(|e| e.to_string()),
        },
    };

    let response = health_response(if store_ok { "ok" } else { "degraded" }, Some(components));

    if store_ok {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Liveness check - is the service alive?
///
/// Returns 200 with an empty body.
async fn livez() -> impl IntoResponse {
    StatusCode::OK
}
