//! Request-scoped context extracted from HTTP requests.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use pitchhub_id::RequestId;
use pitchhub_model::Identity;

use crate::identity::TokenError;
use crate::state::AppState;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// What the caller presented in `Authorization`.
#[derive(Debug, Clone)]
pub enum Credential {
    /// No Authorization header.
    Missing,
    /// A header was present but did not yield a trusted identity.
    Rejected(CredentialRejection),
    /// A validated token.
    Valid(Identity),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialRejection {
    /// Not of the form `Bearer <token>`.
    Malformed,
    Token(TokenError),
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub credential: Credential,
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<Result<String, CredentialRejection>> {
    let auth_value = header_string(headers, AUTHORIZATION_HEADER)?;

    let token = auth_value
        .trim()
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim());

    match token {
        Some(token) if !token.is_empty() => Some(Ok(token.to_string())),
        _ => Some(Err(CredentialRejection::Malformed)),
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request_id = header_string(&parts.headers, REQUEST_ID_HEADER)
            .filter(|id| !id.is_empty() && id.len() <= 128)
            .unwrap_or_else(|| RequestId::new().to_string());

        let credential = match bearer_token(&parts.headers) {
            None => Credential::Missing,
            Some(Err(rejection)) => Credential::Rejected(rejection),
            Some(Ok(token)) => match state.tokens().validate(&token) {
                Ok(identity) => Credential::Valid(identity),
                Err(err) => {
                    tracing::debug!(error = %err, request_id = %request_id, "Rejected bearer token");
                    Credential::Rejected(CredentialRejection::Token(err))
                }
            },
        };

        Ok(Self {
            request_id,
            credential,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_no_header() {
        assert!(bearer_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_bearer_token_extracted() {
        assert_eq!(
            bearer_token(&headers("Bearer abc.def.ghi")),
            Some(Ok("abc.def.ghi".to_string()))
        );
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        for value in ["bearer abc", "BEARER abc", "BeArEr abc"] {
            assert_eq!(bearer_token(&headers(value)), Some(Ok("abc".to_string())));
        }
    }

    #[test]
    fn test_non_bearer_scheme_is_malformed() {
        assert_eq!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Some(Err(CredentialRejection::Malformed))
        );
        assert_eq!(
            bearer_token(&headers("Bearer ")),
            Some(Err(CredentialRejection::Malformed))
        );
        assert_eq!(
            bearer_token(&headers("Bearerabc")),
            Some(Err(CredentialRejection::Malformed))
        );
    }
}
