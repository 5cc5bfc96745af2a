//! Investor access endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use pitchhub_model::AccessGrant;
use serde::{Deserialize, Serialize};

use crate::api::authz::{guard, Endpoint};
use crate::api::error::{json_body, ApiError};
use crate::api::events::{enrollment_list, EnrollmentResponse};
use crate::api::request_context::RequestContext;
use crate::lifecycle::investors;
use crate::state::AppState;

/// Create investor routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/investors/request-access", post(request_access))
        .route("/investors/requests/{event}", get(list_requests))
        .route("/investors/approve", post(approve))
        .route("/investors/event/{event}", get(list_event_enrollments))
        .route("/investors/shortlist", post(shortlist))
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AccessRequest {
    pub event_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub event_name: String,
    pub investor_email: String,
    pub approve: bool,
}

#[derive(Debug, Deserialize)]
pub struct ShortlistRequest {
    pub event_name: String,
    pub startup_email: String,
}

#[derive(Debug, Serialize)]
pub struct GrantResponse {
    pub id: String,
    pub event_name: String,
    pub investor_email: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AccessGrant> for GrantResponse {
    fn from(grant: AccessGrant) -> Self {
        Self {
            id: grant.id.to_string(),
            event_name: grant.event_name,
            investor_email: grant.investor_email,
            approved: grant.approved,
            created_at: grant.created_at,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /investors/request-access
async fn request_access(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<AccessRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let investor = guard(&ctx, Endpoint::RequestAccess)?;
    let req = json_body(payload, &ctx.request_id)?;

    let grant = investors::request_access(state.store(), &investor, &req.event_name)
        .await
        .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok((StatusCode::CREATED, Json(GrantResponse::from(grant))))
}

/// GET /investors/requests/{event}
async fn list_requests(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(event): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let organiser = guard(&ctx, Endpoint::ListAccessRequests)?;

    let grants = investors::list_requests(state.store(), &organiser, &event)
        .await
        .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok(Json(
        grants
            .into_iter()
            .map(GrantResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// POST /investors/approve
async fn approve(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<ApprovalRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let organiser = guard(&ctx, Endpoint::ApproveAccess)?;
    let req = json_body(payload, &ctx.request_id)?;

    let grant = investors::approve(
        state.store(),
        &organiser,
        &req.event_name,
        &req.investor_email,
        req.approve,
    )
    .await
    .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok(Json(GrantResponse::from(grant)))
}

/// GET /investors/event/{event}
async fn list_event_enrollments(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(event): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let investor = guard(&ctx, Endpoint::ListApprovedEnrollments)?;

    let enrollments = investors::list_enrollments(state.store(), &investor, &event)
        .await
        .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok(enrollment_list(enrollments))
}

/// POST /investors/shortlist
async fn shortlist(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<ShortlistRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let investor = guard(&ctx, Endpoint::Shortlist)?;
    let req = json_body(payload, &ctx.request_id)?;

    let enrollment =
        investors::shortlist(state.store(), &investor, &req.event_name, &req.startup_email)
            .await
            .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok(Json(EnrollmentResponse::from(enrollment)))
}
