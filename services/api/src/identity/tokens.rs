//! Signed, expiring access tokens.
//!
//! Tokens are HS256 JWTs carrying the subject email and role label. A token
//! is only trusted after its signature and expiry check out; nothing is read
//! from an unvalidated token.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use pitchhub_model::{Identity, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default access token lifetime.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject email.
    pub sub: String,

    /// Role label, e.g. `organiser`.
    pub role: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Token validation and issuance failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token carries unknown role '{0}'")]
    UnknownRole(String),
}

/// Issues and validates access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a token for `email` acting as `role`.
    pub fn issue(&self, email: &str, role: Role) -> Result<IssuedToken, TokenError> {
        self.issue_at(email, role, Utc::now())
    }

    fn issue_at(
        &self,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let exp = now + self.ttl;
        let claims = Claims {
            sub: email.to_string(),
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or(exp);

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token and return the identity it names.
    pub fn validate(&self, token: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        let claims = data.claims;
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|_| TokenError::UnknownRole(claims.role.clone()))?;

        if claims.sub.is_empty() {
            return Err(TokenError::Invalid("empty subject".to_string()));
        }

        Ok(Identity::new(claims.sub, role))
    }
}
