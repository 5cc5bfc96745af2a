//! Stored records and the drafts they are built from.

use chrono::{DateTime, SubsecRound, Utc};
use pitchhub_id::{EnrollmentId, EventRecordId, GrantId, UserId};

use crate::types::{EnrollmentStatus, EventStatus, Role};

/// Current time at the precision every store keeps (microseconds).
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Truncate a caller-supplied timestamp to store precision.
pub fn to_store_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

// =============================================================================
// Identity
// =============================================================================

/// An authenticated caller, established from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            role,
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user. The credential is stored as an argon2 PHC string.
#[derive(Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("name", &self.name)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Event
// =============================================================================

/// Caller-supplied fields for a new event.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub event_datetime: DateTime<Utc>,
    pub terms_and_conditions: String,
}

/// A pitching event. `organiser_email` names the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventRecordId,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub event_datetime: DateTime<Utc>,
    pub terms_and_conditions: String,
    pub status: EventStatus,
    pub organiser_email: String,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Build a new `upcoming` event owned by `organiser_email`.
    pub fn from_draft(draft: EventDraft, organiser_email: &str) -> Self {
        Self {
            id: EventRecordId::new(),
            name: draft.name,
            description: draft.description,
            image_url: draft.image_url,
            event_datetime: to_store_precision(draft.event_datetime),
            terms_and_conditions: draft.terms_and_conditions,
            status: EventStatus::Upcoming,
            organiser_email: organiser_email.to_string(),
            created_at: timestamp_now(),
        }
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.organiser_email == email
    }
}

// =============================================================================
// Enrollment
// =============================================================================

/// Caller-supplied fields for a new enrollment.
#[derive(Debug, Clone)]
pub struct EnrollmentDraft {
    pub event_name: String,
    pub idea_name: String,
    pub idea_description: String,
    pub team_details: String,
}

/// A startup's idea submitted to one event. Unique per `(event_name, startup_email)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub event_name: String,
    pub startup_email: String,
    pub idea_name: String,
    pub idea_description: String,
    pub team_details: String,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn from_draft(draft: EnrollmentDraft, startup_email: &str) -> Self {
        Self {
            id: EnrollmentId::new(),
            event_name: draft.event_name,
            startup_email: startup_email.to_string(),
            idea_name: draft.idea_name,
            idea_description: draft.idea_description,
            team_details: draft.team_details,
            status: EnrollmentStatus::Submitted,
            created_at: timestamp_now(),
        }
    }
}

// =============================================================================
// Investor access grant
// =============================================================================

/// An investor's request for visibility into one event's enrollments.
/// Unique per `(event_name, investor_email)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub id: GrantId,
    pub event_name: String,
    pub investor_email: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl AccessGrant {
    /// A fresh, unapproved request.
    pub fn requested(event_name: &str, investor_email: &str) -> Self {
        Self {
            id: GrantId::new(),
            event_name: event_name.to_string(),
            investor_email: investor_email.to_string(),
            approved: false,
            created_at: timestamp_now(),
        }
    }
}
