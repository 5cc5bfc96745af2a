//! Startup enrollments.
//!
//! An enrollment starts `submitted` and can only move to `shortlisted`;
//! that transition lives in [`investors::shortlist`](super::investors::shortlist)
//! because it is gated on the investor's access grant.

use pitchhub_model::{Enrollment, EnrollmentDraft, EventStatus, Identity};
use tracing::info;

use super::{conflict_on_duplicate, require_event, LifecycleError};
use crate::db::{EnrollmentFilter, Entity, EntityStore};

const ALREADY_ENROLLED: &str = "Already enrolled in this event";

/// Enroll the caller's idea in an `upcoming` event.
pub async fn create(
    store: &dyn EntityStore,
    startup: &Identity,
    draft: EnrollmentDraft,
) -> Result<Enrollment, LifecycleError> {
    let event = require_event(store, &draft.event_name).await?;
    if event.status != EventStatus::Upcoming {
        return Err(LifecycleError::invalid_state(
            "Can only enroll in upcoming events",
        ));
    }

    if store
        .find_enrollment(&draft.event_name, &startup.email)
        .await?
        .is_some()
    {
        return Err(LifecycleError::conflict("already_enrolled", ALREADY_ENROLLED));
    }

    let enrollment = Enrollment::from_draft(draft, &startup.email);
    store
        .insert_enrollment(&enrollment)
        .await
        .map_err(conflict_on_duplicate(
            Entity::Enrollment,
            "already_enrolled",
            ALREADY_ENROLLED,
        ))?;

    info!(
        event_name = %enrollment.event_name,
        email = %startup.email,
        "Enrollment submitted"
    );
    Ok(enrollment)
}

/// The caller's enrollments, newest first.
pub async fn list_mine(
    store: &dyn EntityStore,
    startup: &Identity,
) -> Result<Vec<Enrollment>, LifecycleError> {
    Ok(store
        .list_enrollments(EnrollmentFilter::ByStartup(&startup.email))
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::events;
    use crate::lifecycle::testing::*;
    use pitchhub_model::EnrollmentStatus;

    fn idea(event_name: &str) -> EnrollmentDraft {
        EnrollmentDraft {
            event_name: event_name.to_string(),
            idea_name: "Foo".to_string(),
            idea_description: "A better foo".to_string(),
            team_details: "Two founders".to_string(),
        }
    }

    #[tokio::test]
    async fn test_enroll_in_upcoming_event() {
        let store = seeded_store().await;
        events::create_event(&store, &organiser(), draft("Pitch1", 3))
            .await
            .unwrap();

        let enrollment = create(&store, &startup(), idea("Pitch1")).await.unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Submitted);
        assert_eq!(enrollment.startup_email, STARTUP);

        let mine = list_mine(&store, &startup()).await.unwrap();
        assert_eq!(mine, vec![enrollment]);
    }

    #[tokio::test]
    async fn test_second_enrollment_conflicts() {
        let store = seeded_store().await;
        events::create_event(&store, &organiser(), draft("Pitch1", 3))
            .await
            .unwrap();
        create(&store, &startup(), idea("Pitch1")).await.unwrap();

        let err = create(&store, &startup(), idea("Pitch1")).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Conflict { code: "already_enrolled", .. }));
    }

    #[tokio::test]
    async fn test_closed_event_rejects_enrollment() {
        let store = seeded_store().await;
        events::create_event(&store, &organiser(), draft("Pitch1", 3))
            .await
            .unwrap();
        events::update_status(&store, &organiser(), "Pitch1", EventStatus::Closed)
            .await
            .unwrap();

        let err = create(&store, &startup(), idea("Pitch1")).await.unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidState { code: "invalid_state", .. }));
        assert!(list_mine(&store, &startup()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_event() {
        let store = seeded_store().await;
        let err = create(&store, &startup(), idea("Nope")).await.unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound { .. }));
    }
}
