//! Event lifecycle: creation, listing, status changes, and the owner's view
//! of enrollments.

use pitchhub_model::{Enrollment, Event, EventDraft, EventStatus, Identity};
use tracing::info;

use super::{conflict_on_duplicate, require_owned_event, LifecycleError};
use crate::db::{EnrollmentFilter, Entity, EntityStore};

const NAME_EXISTS: &str = "Event name already exists";

/// Create a new `upcoming` event owned by the caller.
pub async fn create_event(
    store: &dyn EntityStore,
    organiser: &Identity,
    draft: EventDraft,
) -> Result<Event, LifecycleError> {
    if draft.name.trim().is_empty() {
        return Err(LifecycleError::invalid_input(
            "invalid_event_name",
            "Event name must not be empty",
        ));
    }

    if store.find_event(&draft.name).await?.is_some() {
        return Err(LifecycleError::conflict("event_name_exists", NAME_EXISTS));
    }

    let event = Event::from_draft(draft, &organiser.email);
    store
        .insert_event(&event)
        .await
        .map_err(conflict_on_duplicate(
            Entity::Event,
            "event_name_exists",
            NAME_EXISTS,
        ))?;

    info!(
        event_name = %event.name,
        email = %organiser.email,
        "Event created"
    );
    Ok(event)
}

/// Events owned by the caller, soonest first.
pub async fn list_mine(
    store: &dyn EntityStore,
    organiser: &Identity,
) -> Result<Vec<Event>, LifecycleError> {
    Ok(store.list_events(Some(&organiser.email)).await?)
}

/// Every event, soonest first.
pub async fn list_all(store: &dyn EntityStore) -> Result<Vec<Event>, LifecycleError> {
    Ok(store.list_events(None).await?)
}

/// Set an owned event's status. Any status may be set from any status.
pub async fn update_status(
    store: &dyn EntityStore,
    organiser: &Identity,
    event_name: &str,
    status: EventStatus,
) -> Result<Event, LifecycleError> {
    require_owned_event(
        store,
        event_name,
        &organiser.email,
        "You can only update your own events",
    )
    .await?;

    let event = store
        .set_event_status(event_name, status)
        .await?
        .ok_or_else(super::event_not_found)?;

    info!(
        event_name = %event.name,
        status = %event.status,
        "Event status updated"
    );
    Ok(event)
}

/// All enrollments for an owned event, newest first.
pub async fn list_enrollments_for(
    store: &dyn EntityStore,
    organiser: &Identity,
    event_name: &str,
) -> Result<Vec<Enrollment>, LifecycleError> {
    require_owned_event(
        store,
        event_name,
        &organiser.email,
        "You can only view enrollments for your own events",
    )
    .await?;

    Ok(store
        .list_enrollments(EnrollmentFilter::ByEvent(event_name))
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::testing::*;

    #[tokio::test]
    async fn test_create_sets_owner_and_upcoming() {
        let store = seeded_store().await;
        let event = create_event(&store, &organiser(), draft("Pitch1", 3))
            .await
            .unwrap();

        assert_eq!(event.status, EventStatus::Upcoming);
        assert_eq!(event.organiser_email, ORGANISER);

        // The stored record matches what was returned.
        let stored = store.find_event("Pitch1").await.unwrap().unwrap();
        assert_eq!(stored, event);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let store = seeded_store().await;
        create_event(&store, &organiser(), draft("Pitch1", 3))
            .await
            .unwrap();

        let err = create_event(&store, &other_organiser(), draft("Pitch1", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Conflict { code: "event_name_exists", .. }));
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let store = seeded_store().await;
        let err = create_event(&store, &organiser(), draft("  ", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_list_mine_and_all_ordering() {
        let store = seeded_store().await;
        create_event(&store, &organiser(), draft("Later", 10))
            .await
            .unwrap();
        create_event(&store, &other_organiser(), draft("Sooner", 1))
            .await
            .unwrap();
        create_event(&store, &organiser(), draft("Middle", 5))
            .await
            .unwrap();

        let mine: Vec<_> = list_mine(&store, &organiser())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(mine, vec!["Middle", "Later"]);

        let all: Vec<_> = list_all(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(all, vec!["Sooner", "Middle", "Later"]);
    }

    #[tokio::test]
    async fn test_update_status_is_permissive_for_owner() {
        let store = seeded_store().await;
        create_event(&store, &organiser(), draft("Pitch1", 3))
            .await
            .unwrap();

        let closed = update_status(&store, &organiser(), "Pitch1", EventStatus::Closed)
            .await
            .unwrap();
        assert_eq!(closed.status, EventStatus::Closed);

        let reopened = update_status(&store, &organiser(), "Pitch1", EventStatus::Upcoming)
            .await
            .unwrap();
        assert_eq!(reopened.status, EventStatus::Upcoming);
    }

    #[tokio::test]
    async fn test_update_status_rejects_non_owner() {
        let store = seeded_store().await;
        create_event(&store, &organiser(), draft("Pitch1", 3))
            .await
            .unwrap();

        let err = update_status(&store, &other_organiser(), "Pitch1", EventStatus::Closed)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden { .. }));

        let unchanged = store.find_event("Pitch1").await.unwrap().unwrap();
        assert_eq!(unchanged.status, EventStatus::Upcoming);
    }

    #[tokio::test]
    async fn test_update_status_missing_event() {
        let store = seeded_store().await;
        let err = update_status(&store, &organiser(), "Nope", EventStatus::Closed)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_enrollments_visible_to_owner_only() {
        let store = seeded_store().await;
        create_event(&store, &organiser(), draft("Pitch1", 3))
            .await
            .unwrap();

        assert!(list_enrollments_for(&store, &organiser(), "Pitch1")
            .await
            .unwrap()
            .is_empty());

        let err = list_enrollments_for(&store, &other_organiser(), "Pitch1")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden { .. }));
    }
}
