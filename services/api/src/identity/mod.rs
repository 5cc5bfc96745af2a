//! Caller identity: signed access tokens and stored credentials.

mod password;
mod tokens;

pub use password::{PasswordError, PasswordHasher, MIN_PASSWORD_LEN};
pub use tokens::{Claims, IssuedToken, TokenError, TokenService, DEFAULT_TOKEN_TTL_MINUTES};
