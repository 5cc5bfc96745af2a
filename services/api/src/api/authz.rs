//! Access guard.
//!
//! Every protected route has an [`Endpoint`] with an explicit role set.
//! [`guard`] resolves the caller in two steps: no trusted identity is a 401,
//! then a role outside the set is a 403.

use pitchhub_model::{Identity, Role};

use crate::api::error::ApiError;
use crate::api::request_context::{Credential, CredentialRejection, RequestContext};
use crate::identity::TokenError;

/// Protected routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CreateEvent,
    ListMyEvents,
    UpdateEventStatus,
    ListEventEnrollments,
    ListEvents,
    CreateEnrollment,
    ListMyEnrollments,
    RequestAccess,
    ListAccessRequests,
    ApproveAccess,
    ListApprovedEnrollments,
    Shortlist,
}

const ORGANISER: &[Role] = &[Role::Organiser];
const STARTUP: &[Role] = &[Role::Startup];
const INVESTOR: &[Role] = &[Role::Investor];
const ANY: &[Role] = &Role::ALL;

impl Endpoint {
    pub const ALL: [Endpoint; 12] = [
        Endpoint::CreateEvent,
        Endpoint::ListMyEvents,
        Endpoint::UpdateEventStatus,
        Endpoint::ListEventEnrollments,
        Endpoint::ListEvents,
        Endpoint::CreateEnrollment,
        Endpoint::ListMyEnrollments,
        Endpoint::RequestAccess,
        Endpoint::ListAccessRequests,
        Endpoint::ApproveAccess,
        Endpoint::ListApprovedEnrollments,
        Endpoint::Shortlist,
    ];

    /// Roles allowed to call this endpoint.
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Endpoint::CreateEvent
            | Endpoint::ListMyEvents
            | Endpoint::UpdateEventStatus
            | Endpoint::ListEventEnrollments
            | Endpoint::ListAccessRequests
            | Endpoint::ApproveAccess => ORGANISER,
            Endpoint::ListEvents => ANY,
            Endpoint::CreateEnrollment | Endpoint::ListMyEnrollments => STARTUP,
            Endpoint::RequestAccess
            | Endpoint::ListApprovedEnrollments
            | Endpoint::Shortlist => INVESTOR,
        }
    }

    /// Method and path, for logs and tests.
    pub fn route(self) -> (&'static str, &'static str) {
        match self {
            Endpoint::CreateEvent => ("POST", "/events"),
            Endpoint::ListMyEvents => ("GET", "/events/my"),
            Endpoint::UpdateEventStatus => ("POST", "/events/update-status"),
            Endpoint::ListEventEnrollments => ("GET", "/events/{name}/enrollments"),
            Endpoint::ListEvents => ("GET", "/events"),
            Endpoint::CreateEnrollment => ("POST", "/enrollments"),
            Endpoint::ListMyEnrollments => ("GET", "/enrollments/my"),
            Endpoint::RequestAccess => ("POST", "/investors/request-access"),
            Endpoint::ListAccessRequests => ("GET", "/investors/requests/{event}"),
            Endpoint::ApproveAccess => ("POST", "/investors/approve"),
            Endpoint::ListApprovedEnrollments => ("GET", "/investors/event/{event}"),
            Endpoint::Shortlist => ("POST", "/investors/shortlist"),
        }
    }
}

/// Role check for an established identity.
pub fn authorize<'a>(identity: &'a Identity, allowed: &[Role]) -> Result<&'a Identity, ApiError> {
    if allowed.contains(&identity.role) {
        return Ok(identity);
    }
    let labels = allowed
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Err(ApiError::forbidden(
        "forbidden",
        format!("Access denied. Required role: {labels}"),
    ))
}

/// Resolve the caller for `endpoint`: 401 without a trusted identity, 403 on
/// the wrong role.
pub fn guard(ctx: &RequestContext, endpoint: Endpoint) -> Result<Identity, ApiError> {
    let identity = match &ctx.credential {
        Credential::Valid(identity) => identity,
        Credential::Missing => {
            return Err(
                ApiError::unauthorized("unauthorized", "Not authenticated")
                    .with_request_id(ctx.request_id.clone()),
            );
        }
        Credential::Rejected(rejection) => {
            let message = match rejection {
                CredentialRejection::Token(TokenError::Expired) => "Token has expired",
                _ => "Invalid authentication credentials",
            };
            return Err(ApiError::unauthorized("invalid_token", message)
                .with_request_id(ctx.request_id.clone()));
        }
    };

    authorize(identity, endpoint.allowed_roles())
        .cloned()
        .map_err(|e| {
            let (method, path) = endpoint.route();
            tracing::info!(
                request_id = %ctx.request_id,
                email = %identity.email,
                role = %identity.role,
                method,
                path,
                "Role not permitted"
            );
            e.with_request_id(ctx.request_id.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use rstest::rstest;

    fn ctx(credential: Credential) -> RequestContext {
        RequestContext {
            request_id: "req_test".to_string(),
            credential,
        }
    }

    fn as_role(role: Role) -> RequestContext {
        ctx(Credential::Valid(Identity::new("who@example.com", role)))
    }

    #[test]
    fn test_every_endpoint_declares_roles() {
        for endpoint in Endpoint::ALL {
            assert!(!endpoint.allowed_roles().is_empty(), "{endpoint:?}");
        }
    }

    #[rstest]
    #[case(Endpoint::CreateEvent, Role::Organiser)]
    #[case(Endpoint::ListMyEvents, Role::Organiser)]
    #[case(Endpoint::UpdateEventStatus, Role::Organiser)]
    #[case(Endpoint::ListEventEnrollments, Role::Organiser)]
    #[case(Endpoint::ListAccessRequests, Role::Organiser)]
    #[case(Endpoint::ApproveAccess, Role::Organiser)]
    #[case(Endpoint::CreateEnrollment, Role::Startup)]
    #[case(Endpoint::ListMyEnrollments, Role::Startup)]
    #[case(Endpoint::RequestAccess, Role::Investor)]
    #[case(Endpoint::ListApprovedEnrollments, Role::Investor)]
    #[case(Endpoint::Shortlist, Role::Investor)]
    fn test_single_role_endpoints(#[case] endpoint: Endpoint, #[case] owner: Role) {
        for role in Role::ALL {
            let result = guard(&as_role(role), endpoint);
            if role == owner {
                assert!(result.is_ok(), "{role} should reach {endpoint:?}");
            } else {
                let err = result.unwrap_err();
                assert_eq!(err.status, StatusCode::FORBIDDEN, "{role} on {endpoint:?}");
                assert_eq!(err.problem.request_id, "req_test");
            }
        }
    }

    #[test]
    fn test_list_events_open_to_all_roles() {
        for role in Role::ALL {
            assert!(guard(&as_role(role), Endpoint::ListEvents).is_ok());
        }
    }

    #[rstest]
    #[case(Credential::Missing)]
    #[case(Credential::Rejected(CredentialRejection::Malformed))]
    #[case(Credential::Rejected(CredentialRejection::Token(TokenError::Expired)))]
    #[case(Credential::Rejected(CredentialRejection::Token(TokenError::Invalid("bad".into()))))]
    #[case(Credential::Rejected(CredentialRejection::Token(TokenError::UnknownRole("admin".into()))))]
    fn test_untrusted_callers_get_401_everywhere(#[case] credential: Credential) {
        let ctx = ctx(credential);
        for endpoint in Endpoint::ALL {
            let err = guard(&ctx, endpoint).unwrap_err();
            assert_eq!(err.status, StatusCode::UNAUTHORIZED, "{endpoint:?}");
        }
    }

    #[test]
    fn test_forbidden_message_names_roles() {
        let identity = Identity::new("s@example.com", Role::Startup);
        let err = authorize(&identity, &[Role::Organiser]).unwrap_err();
        assert_eq!(err.problem.detail, "Access denied. Required role: organiser");
    }
}
