//! In-process entity store.
//!
//! Backs local development (`PITCHHUB_STORE=memory`) and tests. All checks
//! and the write itself happen under one write lock, so uniqueness and
//! reference rules hold under concurrent requests just as they do in Postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use pitchhub_model::{AccessGrant, Enrollment, EnrollmentStatus, Event, EventStatus, User};
use tokio::sync::RwLock;

use super::store::{EnrollmentFilter, Entity, EntityStore, StoreError};

/// A record plus its insertion sequence, used to break ordering ties.
#[derive(Debug, Clone)]
struct Stored<T> {
    seq: u64,
    record: T,
}

#[derive(Default)]
struct Tables {
    next_seq: u64,
    users: HashMap<String, Stored<User>>,
    events: HashMap<String, Stored<Event>>,
    enrollments: HashMap<(String, String), Stored<Enrollment>>,
    grants: HashMap<(String, String), Stored<AccessGrant>>,
}

impl Tables {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Entity store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T: Clone>(
    mut rows: Vec<&Stored<T>>,
    created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>,
) -> Vec<T> {
    rows.sort_by(|a, b| {
        created_at(&b.record)
            .cmp(&created_at(&a.record))
            .then(b.seq.cmp(&a.seq))
    });
    rows.into_iter().map(|s| s.record.clone()).collect()
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.email) {
            return Err(StoreError::Duplicate {
                entity: Entity::User,
                key: user.email.clone(),
            });
        }
        let seq = tables.next_seq();
        tables.users.insert(
            user.email.clone(),
            Stored {
                seq,
                record: user.clone(),
            },
        );
        Ok(())
    }

    async fn find_user(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(email).map(|s| s.record.clone()))
    }

    async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.events.contains_key(&event.name) {
            return Err(StoreError::Duplicate {
                entity: Entity::Event,
                key: event.name.clone(),
            });
        }
        if !tables.users.contains_key(&event.organiser_email) {
            return Err(StoreError::MissingReference {
                entity: Entity::Event,
            });
        }
        let seq = tables.next_seq();
        tables.events.insert(
            event.name.clone(),
            Stored {
                seq,
                record: event.clone(),
            },
        );
        Ok(())
    }

    async fn find_event(&self, name: &str) -> Result<Option<Event>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.events.get(name).map(|s| s.record.clone()))
    }

    async fn list_events(&self, organiser_email: Option<&str>) -> Result<Vec<Event>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&Stored<Event>> = tables
            .events
            .values()
            .filter(|s| organiser_email.is_none_or(|email| s.record.organiser_email == email))
            .collect();
        rows.sort_by(|a, b| {
            a.record
                .event_datetime
                .cmp(&b.record.event_datetime)
                .then(a.seq.cmp(&b.seq))
        });
        Ok(rows.into_iter().map(|s| s.record.clone()).collect())
    }

    async fn set_event_status(
        &self,
        name: &str,
        status: EventStatus,
    ) -> Result<Option<Event>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.events.get_mut(name).map(|stored| {
            stored.record.status = status;
            stored.record.clone()
        }))
    }

    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let key = (
            enrollment.event_name.clone(),
            enrollment.startup_email.clone(),
        );
        if tables.enrollments.contains_key(&key) {
            return Err(StoreError::Duplicate {
                entity: Entity::Enrollment,
                key: format!("{}/{}", key.0, key.1),
            });
        }
        if !tables.events.contains_key(&enrollment.event_name)
            || !tables.users.contains_key(&enrollment.startup_email)
        {
            return Err(StoreError::MissingReference {
                entity: Entity::Enrollment,
            });
        }
        let seq = tables.next_seq();
        tables.enrollments.insert(
            key,
            Stored {
                seq,
                record: enrollment.clone(),
            },
        );
        Ok(())
    }

    async fn find_enrollment(
        &self,
        event_name: &str,
        startup_email: &str,
    ) -> Result<Option<Enrollment>, StoreError> {
        let tables = self.tables.read().await;
        let key = (event_name.to_string(), startup_email.to_string());
        Ok(tables.enrollments.get(&key).map(|s| s.record.clone()))
    }

    async fn list_enrollments(
        &self,
        filter: EnrollmentFilter<'_>,
    ) -> Result<Vec<Enrollment>, StoreError> {
        let tables = self.tables.read().await;
        let rows: Vec<&Stored<Enrollment>> = tables
            .enrollments
            .values()
            .filter(|s| match filter {
                EnrollmentFilter::ByEvent(name) => s.record.event_name == name,
                EnrollmentFilter::ByStartup(email) => s.record.startup_email == email,
            })
            .collect();
        Ok(newest_first(rows, |e| e.created_at))
    }

    async fn set_enrollment_status(
        &self,
        event_name: &str,
        startup_email: &str,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>, StoreError> {
        let mut tables = self.tables.write().await;
        let key = (event_name.to_string(), startup_email.to_string());
        Ok(tables.enrollments.get_mut(&key).map(|stored| {
            stored.record.status = status;
            stored.record.clone()
        }))
    }

    async fn insert_grant(&self, grant: &AccessGrant) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let key = (grant.event_name.clone(), grant.investor_email.clone());
        if tables.grants.contains_key(&key) {
            return Err(StoreError::Duplicate {
                entity: Entity::AccessGrant,
                key: format!("{}/{}", key.0, key.1),
            });
        }
        if !tables.events.contains_key(&grant.event_name)
            || !tables.users.contains_key(&grant.investor_email)
        {
            return Err(StoreError::MissingReference {
                entity: Entity::AccessGrant,
            });
        }
        let seq = tables.next_seq();
        tables.grants.insert(
            key,
            Stored {
                seq,
                record: grant.clone(),
            },
        );
        Ok(())
    }

    async fn find_grant(
        &self,
        event_name: &str,
        investor_email: &str,
    ) -> Result<Option<AccessGrant>, StoreError> {
        let tables = self.tables.read().await;
        let key = (event_name.to_string(), investor_email.to_string());
        Ok(tables.grants.get(&key).map(|s| s.record.clone()))
    }

    async fn list_grants(&self, event_name: &str) -> Result<Vec<AccessGrant>, StoreError> {
        let tables = self.tables.read().await;
        let rows: Vec<&Stored<AccessGrant>> = tables
            .grants
            .values()
            .filter(|s| s.record.event_name == event_name)
            .collect();
        Ok(newest_first(rows, |g| g.created_at))
    }

    async fn set_grant_approved(
        &self,
        event_name: &str,
        investor_email: &str,
        approved: bool,
    ) -> Result<Option<AccessGrant>, StoreError> {
        let mut tables = self.tables.write().await;
        let key = (event_name.to_string(), investor_email.to_string());
        Ok(tables.grants.get_mut(&key).map(|stored| {
            stored.record.approved = approved;
            stored.record.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use pitchhub_id::UserId;
    use pitchhub_model::{timestamp_now, EnrollmentDraft, EventDraft, Role};

    use super::*;

    fn user(email: &str, role: Role) -> User {
        User {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role,
            name: email.to_string(),
            created_at: timestamp_now(),
        }
    }

    fn event(name: &str, owner: &str, day: u32) -> Event {
        Event::from_draft(
            EventDraft {
                name: name.to_string(),
                description: "d".to_string(),
                image_url: "u".to_string(),
                event_datetime: Utc.with_ymd_and_hms(2026, 12, day, 9, 0, 0).unwrap(),
                terms_and_conditions: "t".to_string(),
            },
            owner,
        )
    }

    fn enrollment(event_name: &str, startup: &str) -> Enrollment {
        Enrollment::from_draft(
            EnrollmentDraft {
                event_name: event_name.to_string(),
                idea_name: "Foo".to_string(),
                idea_description: "foo".to_string(),
                team_details: "team".to_string(),
            },
            startup,
        )
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_user(&user("org@example.com", Role::Organiser))
            .await
            .unwrap();
        store
            .insert_user(&user("s1@example.com", Role::Startup))
            .await
            .unwrap();
        store
            .insert_user(&user("s2@example.com", Role::Startup))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_duplicate_user_rejected() {
        let store = seeded().await;
        let err = store
            .insert_user(&user("org@example.com", Role::Investor))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Duplicate {
                entity: Entity::User,
                ..
            }
        ));
        // The first record is kept.
        let stored = store.find_user("org@example.com").await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Organiser);
    }

    #[tokio::test]
    async fn test_event_requires_existing_organiser() {
        let store = seeded().await;
        let err = store
            .insert_event(&event("Ghost", "nobody@example.com", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference { .. }));
    }

    #[tokio::test]
    async fn test_events_sorted_by_datetime() {
        let store = seeded().await;
        store
            .insert_event(&event("Late", "org@example.com", 20))
            .await
            .unwrap();
        store
            .insert_event(&event("Early", "org@example.com", 3))
            .await
            .unwrap();
        let names: Vec<_> = store
            .list_events(None)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Early", "Late"]);
    }

    #[tokio::test]
    async fn test_list_events_filters_by_owner() {
        let store = seeded().await;
        store
            .insert_user(&user("org2@example.com", Role::Organiser))
            .await
            .unwrap();
        store
            .insert_event(&event("Mine", "org@example.com", 1))
            .await
            .unwrap();
        store
            .insert_event(&event("Theirs", "org2@example.com", 2))
            .await
            .unwrap();
        let mine = store.list_events(Some("org@example.com")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Mine");
    }

    #[tokio::test]
    async fn test_enrollments_newest_first() {
        let store = seeded().await;
        store
            .insert_event(&event("Pitch1", "org@example.com", 1))
            .await
            .unwrap();
        let mut older = enrollment("Pitch1", "s1@example.com");
        older.created_at = older.created_at - Duration::seconds(5);
        store.insert_enrollment(&older).await.unwrap();
        store
            .insert_enrollment(&enrollment("Pitch1", "s2@example.com"))
            .await
            .unwrap();

        let listed = store
            .list_enrollments(EnrollmentFilter::ByEvent("Pitch1"))
            .await
            .unwrap();
        let emails: Vec<_> = listed.iter().map(|e| e.startup_email.as_str()).collect();
        assert_eq!(emails, vec!["s2@example.com", "s1@example.com"]);
    }

    #[tokio::test]
    async fn test_set_status_on_missing_enrollment_returns_none() {
        let store = seeded().await;
        let updated = store
            .set_enrollment_status("Nope", "s1@example.com", EnrollmentStatus::Shortlisted)
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_enrollments_exactly_one_wins() {
        let store = Arc::new(seeded().await);
        store
            .insert_event(&event("Pitch1", "org@example.com", 1))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .insert_enrollment(&enrollment("Pitch1", "s1@example.com"))
                    .await
            }));
        }

        let mut ok = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(StoreError::Duplicate { .. }) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(duplicates, 15);
    }
}
