//! Investor access grants and the approval-gated view of enrollments.

use pitchhub_model::{AccessGrant, Enrollment, EnrollmentStatus, EventStatus, Identity};
use tracing::info;

use super::{conflict_on_duplicate, require_event, require_owned_event, LifecycleError};
use crate::db::{EnrollmentFilter, Entity, EntityStore};

const REQUEST_EXISTS: &str = "Access request already exists";

fn not_approved() -> LifecycleError {
    LifecycleError::forbidden("access_not_approved", "Access not approved for this event")
}

/// Fail unless the investor holds an approved grant for the event.
async fn require_approved_grant(
    store: &dyn EntityStore,
    event_name: &str,
    investor_email: &str,
) -> Result<(), LifecycleError> {
    match store.find_grant(event_name, investor_email).await? {
        Some(grant) if grant.approved => Ok(()),
        _ => Err(not_approved()),
    }
}

/// Request visibility into an event. The grant starts unapproved.
pub async fn request_access(
    store: &dyn EntityStore,
    investor: &Identity,
    event_name: &str,
) -> Result<AccessGrant, LifecycleError> {
    require_event(store, event_name).await?;

    if store
        .find_grant(event_name, &investor.email)
        .await?
        .is_some()
    {
        return Err(LifecycleError::conflict("access_request_exists", REQUEST_EXISTS));
    }

    let grant = AccessGrant::requested(event_name, &investor.email);
    store
        .insert_grant(&grant)
        .await
        .map_err(conflict_on_duplicate(
            Entity::AccessGrant,
            "access_request_exists",
            REQUEST_EXISTS,
        ))?;

    info!(
        event_name = %grant.event_name,
        email = %investor.email,
        "Investor access requested"
    );
    Ok(grant)
}

/// Access requests for an owned event, newest first.
pub async fn list_requests(
    store: &dyn EntityStore,
    organiser: &Identity,
    event_name: &str,
) -> Result<Vec<AccessGrant>, LifecycleError> {
    require_owned_event(
        store,
        event_name,
        &organiser.email,
        "You can only view requests for your own events",
    )
    .await?;

    Ok(store.list_grants(event_name).await?)
}

/// Set a grant's approval on an owned event. Either direction, repeatable.
pub async fn approve(
    store: &dyn EntityStore,
    organiser: &Identity,
    event_name: &str,
    investor_email: &str,
    approved: bool,
) -> Result<AccessGrant, LifecycleError> {
    require_owned_event(
        store,
        event_name,
        &organiser.email,
        "You can only approve requests for your own events",
    )
    .await?;

    let grant = store
        .set_grant_approved(event_name, investor_email, approved)
        .await?
        .ok_or_else(|| {
            LifecycleError::not_found("access_request_not_found", "Access request not found")
        })?;

    info!(
        event_name = %grant.event_name,
        email = %grant.investor_email,
        approved = grant.approved,
        "Investor access updated"
    );
    Ok(grant)
}

/// All enrollments for an event, for an investor with approved access.
pub async fn list_enrollments(
    store: &dyn EntityStore,
    investor: &Identity,
    event_name: &str,
) -> Result<Vec<Enrollment>, LifecycleError> {
    require_event(store, event_name).await?;
    require_approved_grant(store, event_name, &investor.email).await?;

    Ok(store
        .list_enrollments(EnrollmentFilter::ByEvent(event_name))
        .await?)
}

/// Shortlist a startup's enrollment in a closed event.
///
/// Shortlisting an already shortlisted enrollment succeeds and changes nothing.
pub async fn shortlist(
    store: &dyn EntityStore,
    investor: &Identity,
    event_name: &str,
    startup_email: &str,
) -> Result<Enrollment, LifecycleError> {
    let event = require_event(store, event_name).await?;
    if event.status != EventStatus::Closed {
        return Err(LifecycleError::invalid_state(
            "Can only shortlist startups after event is closed",
        ));
    }

    require_approved_grant(store, event_name, &investor.email).await?;

    let enrollment = store
        .set_enrollment_status(event_name, startup_email, EnrollmentStatus::Shortlisted)
        .await?
        .ok_or_else(|| {
            LifecycleError::not_found("enrollment_not_found", "Enrollment not found")
        })?;

    info!(
        event_name = %enrollment.event_name,
        email = %enrollment.startup_email,
        investor = %investor.email,
        "Enrollment shortlisted"
    );
    Ok(enrollment)
}
