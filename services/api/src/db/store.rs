//! Entity store contract.
//!
//! Lifecycle components only talk to persistence through [`EntityStore`].
//! Implementations must enforce the uniqueness rules themselves and report a
//! violation as [`StoreError::Duplicate`] rather than overwriting: the
//! components' own existence checks are not atomic with the insert.

use async_trait::async_trait;
use pitchhub_model::{AccessGrant, Enrollment, EnrollmentStatus, Event, EventStatus, User};
use thiserror::Error;

/// Record kinds held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Event,
    Enrollment,
    AccessGrant,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::User => "user",
            Entity::Event => "event",
            Entity::Enrollment => "enrollment",
            Entity::AccessGrant => "access_grant",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key already exists.
    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: Entity, key: String },

    /// A referenced user or event does not exist.
    #[error("{entity} references a record that does not exist")]
    MissingReference { entity: Entity },

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// Any other query failure.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// A stored value could not be decoded into a domain type.
    #[error("corrupt {entity} record: {message}")]
    Corrupt { entity: Entity, message: String },
}

/// Which enrollments to list.
#[derive(Debug, Clone, Copy)]
pub enum EnrollmentFilter<'a> {
    ByEvent(&'a str),
    ByStartup(&'a str),
}

/// Persistence interface for pitchhub records.
///
/// Ordering contract:
/// - events: `event_datetime` ascending
/// - enrollments and grants: `created_at` descending (newest first)
///
/// Ties fall back to insertion order (earlier first for events, later first
/// otherwise).
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Round-trip to the backing store.
    async fn ping(&self) -> Result<(), StoreError>;

    // Users

    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_user(&self, email: &str) -> Result<Option<User>, StoreError>;

    // Events

    async fn insert_event(&self, event: &Event) -> Result<(), StoreError>;

    async fn find_event(&self, name: &str) -> Result<Option<Event>, StoreError>;

    /// All events, or only those owned by `organiser_email`.
    async fn list_events(&self, organiser_email: Option<&str>) -> Result<Vec<Event>, StoreError>;

    /// Returns the updated event, or `None` if no event has that name.
    async fn set_event_status(
        &self,
        name: &str,
        status: EventStatus,
    ) -> Result<Option<Event>, StoreError>;

    // Enrollments

    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StoreError>;

    async fn find_enrollment(
        &self,
        event_name: &str,
        startup_email: &str,
    ) -> Result<Option<Enrollment>, StoreError>;

    async fn list_enrollments(
        &self,
        filter: EnrollmentFilter<'_>,
    ) -> Result<Vec<Enrollment>, StoreError>;

    /// Returns the updated enrollment, or `None` if no enrollment matches.
    async fn set_enrollment_status(
        &self,
        event_name: &str,
        startup_email: &str,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>, StoreError>;

    // Investor access grants

    async fn insert_grant(&self, grant: &AccessGrant) -> Result<(), StoreError>;

    async fn find_grant(
        &self,
        event_name: &str,
        investor_email: &str,
    ) -> Result<Option<AccessGrant>, StoreError>;

    async fn list_grants(&self, event_name: &str) -> Result<Vec<AccessGrant>, StoreError>;

    /// Returns the updated grant, or `None` if no grant matches.
    async fn set_grant_approved(
        &self,
        event_name: &str,
        investor_email: &str,
        approved: bool,
    ) -> Result<Option<AccessGrant>, StoreError>;
}
