//! Event endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use pitchhub_model::{Enrollment, EnrollmentStatus, Event, EventDraft, EventStatus};
use serde::{Deserialize, Serialize};

use crate::api::authz::{guard, Endpoint};
use crate::api::error::{json_body, ApiError};
use crate::api::request_context::RequestContext;
use crate::lifecycle::events;
use crate::state::AppState;

/// Create event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event).get(list_events))
        .route("/events/my", get(list_my_events))
        .route("/events/update-status", post(update_status))
        .route("/events/{name}/enrollments", get(list_event_enrollments))
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub event_datetime: DateTime<Utc>,
    pub terms_and_conditions: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub event_name: String,
    pub status: EventStatus,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub event_datetime: DateTime<Utc>,
    pub terms_and_conditions: String,
    pub status: EventStatus,
    pub organiser_email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id.to_string(),
            name: event.name,
            description: event.description,
            image_url: event.image_url,
            event_datetime: event.event_datetime,
            terms_and_conditions: event.terms_and_conditions,
            status: event.status,
            organiser_email: event.organiser_email,
            created_at: event.created_at,
        }
    }
}

/// Response for a single enrollment. Shared by the organiser, startup, and
/// investor views.
#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub id: String,
    pub event_name: String,
    pub startup_email: String,
    pub idea_name: String,
    pub idea_description: String,
    pub team_details: String,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id.to_string(),
            event_name: enrollment.event_name,
            startup_email: enrollment.startup_email,
            idea_name: enrollment.idea_name,
            idea_description: enrollment.idea_description,
            team_details: enrollment.team_details,
            status: enrollment.status,
            created_at: enrollment.created_at,
        }
    }
}

pub(crate) fn enrollment_list(enrollments: Vec<Enrollment>) -> Json<Vec<EnrollmentResponse>> {
    Json(enrollments.into_iter().map(EnrollmentResponse::from).collect())
}

fn event_list(events: Vec<Event>) -> Json<Vec<EventResponse>> {
    Json(events.into_iter().map(EventResponse::from).collect())
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /events
async fn create_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let organiser = guard(&ctx, Endpoint::CreateEvent)?;
    let req = json_body(payload, &ctx.request_id)?;

    let draft = EventDraft {
        name: req.name,
        description: req.description,
        image_url: req.image_url,
        event_datetime: req.event_datetime,
        terms_and_conditions: req.terms_and_conditions,
    };

    let event = events::create_event(state.store(), &organiser, draft)
        .await
        .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

/// GET /events
async fn list_events(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    guard(&ctx, Endpoint::ListEvents)?;

    let events = events::list_all(state.store())
        .await
        .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok(event_list(events))
}

/// GET /events/my
async fn list_my_events(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    let organiser = guard(&ctx, Endpoint::ListMyEvents)?;

    let events = events::list_mine(state.store(), &organiser)
        .await
        .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok(event_list(events))
}

/// POST /events/update-status
async fn update_status(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let organiser = guard(&ctx, Endpoint::UpdateEventStatus)?;
    let req = json_body(payload, &ctx.request_id)?;

    let event = events::update_status(state.store(), &organiser, &req.event_name, req.status)
        .await
        .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok(Json(EventResponse::from(event)))
}

/// GET /events/{name}/enrollments
async fn list_event_enrollments(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let organiser = guard(&ctx, Endpoint::ListEventEnrollments)?;

    let enrollments = events::list_enrollments_for(state.store(), &organiser, &name)
        .await
        .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok(enrollment_list(enrollments))
}
