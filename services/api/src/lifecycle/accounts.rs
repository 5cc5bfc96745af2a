//! Registration and login.

use pitchhub_id::UserId;
use pitchhub_model::{timestamp_now, Role, User};
use tracing::info;

use super::{conflict_on_duplicate, LifecycleError};
use crate::db::{Entity, EntityStore};
use crate::identity::{IssuedToken, PasswordHasher, TokenService, MIN_PASSWORD_LEN};

const EMAIL_TAKEN: &str = "Email already registered";
const BAD_CREDENTIALS: &str = "Incorrect email or password";

/// Caller-supplied registration fields.
#[derive(Debug, Clone)]
pub struct RegisterDraft {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub name: String,
}

/// The collaborators account operations need besides the store.
#[derive(Clone, Copy)]
pub struct Credentials<'a> {
    pub hasher: &'a PasswordHasher,
    pub tokens: &'a TokenService,
}

/// Minimal address shape check: one `@`, a non-empty local part, and a
/// dotted domain with no empty labels.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn validate(draft: &RegisterDraft) -> Result<(), LifecycleError> {
    if !is_valid_email(&draft.email) {
        return Err(LifecycleError::invalid_input(
            "invalid_email",
            "Invalid email address",
        ));
    }
    if draft.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LifecycleError::invalid_input(
            "invalid_password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if draft.name.trim().is_empty() {
        return Err(LifecycleError::invalid_input(
            "invalid_name",
            "Name must not be empty",
        ));
    }
    Ok(())
}

fn issue(tokens: &TokenService, user: &User) -> Result<IssuedToken, LifecycleError> {
    tokens
        .issue(&user.email, user.role)
        .map_err(LifecycleError::TokenIssue)
}

/// Create a user and sign them in.
pub async fn register(
    store: &dyn EntityStore,
    credentials: Credentials<'_>,
    draft: RegisterDraft,
) -> Result<(User, IssuedToken), LifecycleError> {
    validate(&draft)?;

    if store.find_user(&draft.email).await?.is_some() {
        return Err(LifecycleError::conflict("email_taken", EMAIL_TAKEN));
    }

    let password_hash = credentials.hasher.hash(&draft.password).await?;
    let user = User {
        id: UserId::new(),
        email: draft.email,
        password_hash,
        role: draft.role,
        name: draft.name,
        created_at: timestamp_now(),
    };

    store
        .insert_user(&user)
        .await
        .map_err(conflict_on_duplicate(Entity::User, "email_taken", EMAIL_TAKEN))?;

    info!(email = %user.email, role = %user.role, "User registered");

    let token = issue(credentials.tokens, &user)?;
    Ok((user, token))
}

/// Verify a credential and issue a fresh token.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    store: &dyn EntityStore,
    credentials: Credentials<'_>,
    email: &str,
    password: &str,
) -> Result<(User, IssuedToken), LifecycleError> {
    let rejected = || LifecycleError::unauthorized("invalid_credentials", BAD_CREDENTIALS);

    let user = store.find_user(email).await?.ok_or_else(rejected)?;
    if !credentials
        .hasher
        .verify(password, &user.password_hash)
        .await?
    {
        return Err(rejected());
    }

    let token = issue(credentials.tokens, &user)?;
    Ok((user, token))
}
