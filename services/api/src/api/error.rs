use axum::{
    extract::rejection::JsonRejection,
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::StoreError;
use crate::lifecycle::LifecycleError;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    pub code: String,
    pub request_id: String,
    pub retryable: bool,
}

impl ProblemDetails {
    fn new(status: StatusCode, code: impl Into<String>, detail: impl Into<String>) -> Self {
        let code = code.into();
        let title = status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string();
        Self {
            r#type: format!("https://pitchhub.dev/problems/{code}"),
            title,
            status: status.as_u16(),
            detail: detail.into(),
            instance: None,
            code,
            request_id: "unknown".to_string(),
            retryable: false,
        }
    }

    fn set_request_id(&mut self, request_id: impl Into<String>) {
        let request_id = request_id.into();
        self.request_id = request_id.clone();
        if self.instance.is_none() {
            self.instance = Some(request_id);
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub problem: Box<ProblemDetails>,
}

impl ApiError {
    fn with_status(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        let problem = Box::new(ProblemDetails::new(status, code, message));
        Self { status, problem }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn forbidden(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CONFLICT, code, message)
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    pub fn service_unavailable(code: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::with_status(StatusCode::SERVICE_UNAVAILABLE, code, message);
        err.problem.retryable = true;
        err
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.problem.set_request_id(request_id);
        self
    }

    /// Convert a lifecycle failure for the given request, logging anything
    /// that is not the caller's fault.
    pub fn from_lifecycle(err: LifecycleError, request_id: &str) -> Self {
        match &err {
            LifecycleError::Store(StoreError::Duplicate { .. })
            | LifecycleError::Store(StoreError::MissingReference { .. }) => {
                tracing::warn!(error = %err, request_id = %request_id, "Store rejected write");
            }
            LifecycleError::Store(_)
            | LifecycleError::Credential(_)
            | LifecycleError::TokenIssue(_) => {
                tracing::error!(error = %err, request_id = %request_id, "Request failed");
            }
            _ => {}
        }
        ApiError::from(err).with_request_id(request_id)
    }
}

/// Unwrap a JSON body taken as `Result<Json<T>, JsonRejection>`.
///
/// Handlers take the body this way so the access guard runs before the body
/// is looked at; a bad body then becomes a problem document.
pub fn json_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    request_id: &str,
) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!(error = %rejection, request_id = %request_id, "Rejected request body");
            Err(ApiError::bad_request("invalid_body", rejection.body_text())
                .with_request_id(request_id))
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        let code = err.code();
        match err {
            LifecycleError::Unauthorized { message, .. } => ApiError::unauthorized(code, message),
            LifecycleError::Forbidden { message, .. } => ApiError::forbidden(code, message),
            LifecycleError::NotFound { message, .. } => ApiError::not_found(code, message),
            LifecycleError::Conflict { message, .. } => ApiError::conflict(code, message),
            LifecycleError::InvalidState { message, .. }
            | LifecycleError::InvalidInput { message, .. } => ApiError::bad_request(code, message),
            LifecycleError::Store(StoreError::Duplicate { entity, .. }) => {
                ApiError::conflict(code, format!("{entity} already exists"))
            }
            LifecycleError::Store(StoreError::MissingReference { entity }) => {
                ApiError::not_found(code, format!("{entity} references a missing record"))
            }
            LifecycleError::Store(StoreError::Unavailable(_)) => {
                ApiError::service_unavailable(code, "Database unavailable")
            }
            LifecycleError::Store(_) | LifecycleError::Credential(_) | LifecycleError::TokenIssue(_) => {
                ApiError::internal(code, "Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.problem)).into_response();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Entity;
    use rstest::rstest;

    #[rstest]
    #[case(LifecycleError::unauthorized("invalid_credentials", "no"), StatusCode::UNAUTHORIZED)]
    #[case(LifecycleError::forbidden("not_event_owner", "no"), StatusCode::FORBIDDEN)]
    #[case(LifecycleError::not_found("event_not_found", "no"), StatusCode::NOT_FOUND)]
    #[case(LifecycleError::conflict("event_name_exists", "no"), StatusCode::CONFLICT)]
    #[case(LifecycleError::invalid_state("no"), StatusCode::BAD_REQUEST)]
    #[case(LifecycleError::invalid_input("invalid_email", "no"), StatusCode::BAD_REQUEST)]
    #[case(
        LifecycleError::Store(StoreError::Duplicate { entity: Entity::Event, key: "x".to_string() }),
        StatusCode::CONFLICT
    )]
    #[case(
        LifecycleError::Store(StoreError::MissingReference { entity: Entity::Enrollment }),
        StatusCode::NOT_FOUND
    )]
    #[case(
        LifecycleError::Store(StoreError::Unavailable(sqlx::Error::PoolTimedOut)),
        StatusCode::SERVICE_UNAVAILABLE
    )]
    #[case(
        LifecycleError::Store(StoreError::Query(sqlx::Error::RowNotFound)),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn test_lifecycle_status_mapping(#[case] err: LifecycleError, #[case] expected: StatusCode) {
        assert_eq!(ApiError::from(err).status, expected);
    }

    #[test]
    fn test_invalid_state_code() {
        let err = ApiError::from(LifecycleError::invalid_state(
            "Can only enroll in upcoming events",
        ));
        assert_eq!(err.problem.code, "invalid_state");
        assert_eq!(err.problem.detail, "Can only enroll in upcoming events");
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = ApiError::from(LifecycleError::Store(StoreError::Query(
            sqlx::Error::RowNotFound,
        )));
        assert_eq!(err.problem.detail, "Internal server error");
    }

    #[derive(Debug, serde::Deserialize)]
    struct Named {
        name: String,
    }

    async fn extract(content_type: Option<&str>, raw: &str) -> Result<Json<Named>, JsonRejection> {
        use axum::extract::FromRequest;

        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let request = builder.body(axum::body::Body::from(raw.to_string())).unwrap();
        Json::<Named>::from_request(request, &()).await
    }

    #[tokio::test]
    async fn test_json_body_passes_valid_payload() {
        let payload = extract(Some("application/json"), r#"{"name":"Pitch1"}"#).await;
        let body = json_body(payload, "req_test").unwrap();
        assert_eq!(body.name, "Pitch1");
    }

    #[rstest]
    #[case(Some("application/json"), "{}")]
    #[case(Some("application/json"), "{not json")]
    #[case(Some("text/plain"), r#"{"name":"Pitch1"}"#)]
    #[case(None, "")]
    #[tokio::test]
    async fn test_json_body_rejection_is_bad_request(
        #[case] content_type: Option<&str>,
        #[case] raw: &str,
    ) {
        let err = json_body(extract(content_type, raw).await, "req_test").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.problem.code, "invalid_body");
        assert_eq!(err.problem.request_id, "req_test");
    }

    #[tokio::test]
    async fn test_problem_json_response() {
        let response = ApiError::conflict("event_name_exists", "Event name already exists")
            .with_request_id("req_test")
            .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let problem: ProblemDetails = serde_json::from_slice(&body).unwrap();
        assert_eq!(problem.code, "event_name_exists");
        assert_eq!(problem.request_id, "req_test");
        assert_eq!(problem.status, 409);
    }
}
