//! Registration and login endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use pitchhub_model::{Role, User};
use serde::{Deserialize, Serialize};

use crate::api::error::{json_body, ApiError};
use crate::api::request_context::RequestContext;
use crate::identity::IssuedToken;
use crate::lifecycle::accounts::{self, RegisterDraft};
use crate::state::AppState;

/// Create auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user. Never carries the credential.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl TokenResponse {
    fn new(user: &User, issued: IssuedToken) -> Self {
        Self {
            access_token: issued.token,
            token_type: "bearer",
            expires_at: issued.expires_at,
            user: UserResponse::from(user),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload, &ctx.request_id)?;

    let draft = RegisterDraft {
        email: req.email.trim().to_string(),
        password: req.password,
        role: req.role,
        name: req.name.trim().to_string(),
    };

    let (user, issued) = accounts::register(state.store(), state.credentials(), draft)
        .await
        .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    Ok((StatusCode::CREATED, Json(TokenResponse::new(&user, issued))))
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload, &ctx.request_id)?;

    let (user, issued) = accounts::login(
        state.store(),
        state.credentials(),
        req.email.trim(),
        &req.password,
    )
    .await
    .map_err(|e| ApiError::from_lifecycle(e, &ctx.request_id))?;

    tracing::info!(request_id = %ctx.request_id, email = %user.email, "User logged in");

    Ok(Json(TokenResponse::new(&user, issued)))
}
