//! HTTP API handlers and routing.

pub mod authz;
pub mod error;
mod auth;
mod enrollments;
mod events;
mod health;
mod investors;
pub mod request_context;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Create the main API router with all routes and middleware.
///
/// `cors_origins` lists the browser origins allowed to call the API with
/// credentials. Origins that are not valid header values are skipped.
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(origins)
        .allow_credentials(true);

    Router::new()
        // Banner and health endpoints (no auth required)
        .merge(health::routes())
        .merge(auth::routes())
        .merge(events::routes())
        .merge(enrollments::routes())
        .merge(investors::routes())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Application state
        .with_state(state)
}
