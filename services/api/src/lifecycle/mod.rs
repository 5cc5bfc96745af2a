//! Lifecycle components: the rules for who may do what to which record,
//! and in which phase.
//!
//! Every operation takes the caller's [`Identity`](pitchhub_model::Identity)
//! after the access guard has checked its role, and talks to persistence only
//! through [`EntityStore`](crate::db::EntityStore). Existence pre-checks give
//! friendly errors; the store's uniqueness constraints are what actually
//! decide concurrent duplicates, and those are mapped to the same conflict.

pub mod accounts;
pub mod enrollments;
pub mod events;
pub mod investors;

use thiserror::Error;

use crate::db::{Entity, EntityStore, StoreError};
use crate::identity::{PasswordError, TokenError};

use pitchhub_model::Event;

/// Domain rule violations and the infrastructure failures behind them.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{message}")]
    Unauthorized { code: &'static str, message: String },

    #[error("{message}")]
    Forbidden { code: &'static str, message: String },

    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    /// Action attempted outside the lifecycle phase that permits it.
    #[error("{message}")]
    InvalidState { code: &'static str, message: String },

    #[error("{message}")]
    InvalidInput { code: &'static str, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Credential(#[from] PasswordError),

    #[error("failed to issue token: {0}")]
    TokenIssue(#[source] TokenError),
}

impl LifecycleError {
    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            code: "invalid_state",
            message: message.into(),
        }
    }

    pub fn invalid_input(code: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code,
            message: message.into(),
        }
    }

    /// Stable machine code, where one exists.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { code, .. }
            | Self::Forbidden { code, .. }
            | Self::NotFound { code, .. }
            | Self::Conflict { code, .. }
            | Self::InvalidState { code, .. }
            | Self::InvalidInput { code, .. } => code,
            Self::Store(StoreError::Duplicate { .. }) => "duplicate",
            Self::Store(StoreError::MissingReference { .. }) => "missing_reference",
            Self::Store(StoreError::Unavailable(_)) => "store_unavailable",
            Self::Store(_) | Self::Credential(_) | Self::TokenIssue(_) => "internal_error",
        }
    }
}

/// Map a store uniqueness violation to the caller-facing conflict for `entity`.
///
/// Used on insert so a racing duplicate that slipped past the pre-check gets
/// the same answer as one the pre-check caught.
pub(crate) fn conflict_on_duplicate(
    entity: Entity,
    code: &'static str,
    message: &'static str,
) -> impl FnOnce(StoreError) -> LifecycleError {
    move |err| match err {
        StoreError::Duplicate { entity: e, .. } if e == entity => {
            LifecycleError::conflict(code, message)
        }
        other => LifecycleError::Store(other),
    }
}

pub(crate) fn event_not_found() -> LifecycleError {
    LifecycleError::not_found("event_not_found", "Event not found")
}

/// Load an event or fail with `event_not_found`.
pub(crate) async fn require_event(
    store: &dyn EntityStore,
    event_name: &str,
) -> Result<Event, LifecycleError> {
    store
        .find_event(event_name)
        .await?
        .ok_or_else(event_not_found)
}

/// Load an event owned by `email`, or fail with not-found / `forbidden_message`.
pub(crate) async fn require_owned_event(
    store: &dyn EntityStore,
    event_name: &str,
    email: &str,
    forbidden_message: &'static str,
) -> Result<Event, LifecycleError> {
    let event = require_event(store, event_name).await?;
    if !event.is_owned_by(email) {
        return Err(LifecycleError::forbidden("not_event_owner", forbidden_message));
    }
    Ok(event)
}
