//! Startup enrollment endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use pitchhub_model::EnrollmentDraft;
use serde::Deserialize;

use crate::api::authz::{guard, Endpoint};
use crate::api::error::{json_body, ApiError};
use crate::api::events::{enrollment_list, EnrollmentResponse};
use crate::api::request_context::RequestContext;
use crate::lifecycle::enrollments;
use crate::state::AppState;

/// Create enrollment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/enrollments", post(create_enrollment))
        .route("/enrollments/my", get(list_my_enrollments))
}

#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub event_name: String,
    pub idea_name: String,
    pub idea_description: String,
    pub team_details: String,
}

/// POST /enrollments
async fn create_enrollment(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<CreateEnrollmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let startup = guard(&ctx, Endpoint::CreateEnrollment)?;
    let req = json_body(payload, &ctx.request_id)?;

    let draft = EnrollmentDraft {
        event_name: req.event_name,
        idea_name: req.idea_name,
        idea_description: req.idea_description,
        team_details: req.team_details,
    };

    let enrollment = enrollments::create(state.store(), &startup, draft)
        .await
        .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from(enrollment))))
}

/// GET /enrollments/my
async fn list_my_enrollments(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    let startup = guard(&ctx, Endpoint::ListMyEnrollments)?;

    let enrollments = enrollments::list_mine(state.store(), &startup)
        .await
        .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok(enrollment_list(enrollments))
}
