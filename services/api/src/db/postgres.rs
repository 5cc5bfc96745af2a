//! Postgres-backed entity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pitchhub_model::{AccessGrant, Enrollment, EnrollmentStatus, Event, EventStatus, User};
use sqlx::{postgres::PgPool, postgres::PgRow, Row};

use super::store::{EnrollmentFilter, Entity, EntityStore, StoreError};

const USER_COLUMNS: &str = "id, email, password_hash, role, name, created_at";

const EVENT_COLUMNS: &str = "id, name, description, image_url, event_datetime, \
     terms_and_conditions, status, organiser_email, created_at";

const ENROLLMENT_COLUMNS: &str = "id, event_name, startup_email, idea_name, \
     idea_description, team_details, status, created_at";

const GRANT_COLUMNS: &str = "id, event_name, investor_email, approved, created_at";

/// Entity store over a Postgres pool.
///
/// Uniqueness and references are enforced by table constraints; violations
/// come back as [`StoreError::Duplicate`] and [`StoreError::MissingReference`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Classify a sqlx error for `entity`, naming `key` on unique violations.
fn classify(entity: Entity, key: impl FnOnce() -> String, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::Duplicate {
                entity,
                key: key(),
            }
        }
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            StoreError::MissingReference { entity }
        }
        other => query_error(other),
    }
}

fn query_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err)
        }
        other => StoreError::Query(other),
    }
}

fn column<'r, T>(row: &'r PgRow, entity: Entity, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name).map_err(|e| StoreError::Corrupt {
        entity,
        message: format!("column {name}: {e}"),
    })
}

fn parsed<T>(row: &PgRow, entity: Entity, name: &str) -> Result<T, StoreError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = column(row, entity, name)?;
    raw.parse().map_err(|e: T::Err| StoreError::Corrupt {
        entity,
        message: format!("column {name}: {e}"),
    })
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let entity = Entity::User;
    Ok(User {
        id: parsed(row, entity, "id")?,
        email: column(row, entity, "email")?,
        password_hash: column(row, entity, "password_hash")?,
        role: parsed(row, entity, "role")?,
        name: column(row, entity, "name")?,
        created_at: column::<DateTime<Utc>>(row, entity, "created_at")?,
    })
}

fn event_from_row(row: &PgRow) -> Result<Event, StoreError> {
    let entity = Entity::Event;
    Ok(Event {
        id: parsed(row, entity, "id")?,
        name: column(row, entity, "name")?,
        description: column(row, entity, "description")?,
        image_url: column(row, entity, "image_url")?,
        event_datetime: column::<DateTime<Utc>>(row, entity, "event_datetime")?,
        terms_and_conditions: column(row, entity, "terms_and_conditions")?,
        status: parsed(row, entity, "status")?,
        organiser_email: column(row, entity, "organiser_email")?,
        created_at: column::<DateTime<Utc>>(row, entity, "created_at")?,
    })
}

fn enrollment_from_row(row: &PgRow) -> Result<Enrollment, StoreError> {
    let entity = Entity::Enrollment;
    Ok(Enrollment {
        id: parsed(row, entity, "id")?,
        event_name: column(row, entity, "event_name")?,
        startup_email: column(row, entity, "startup_email")?,
        idea_name: column(row, entity, "idea_name")?,
        idea_description: column(row, entity, "idea_description")?,
        team_details: column(row, entity, "team_details")?,
        status: parsed(row, entity, "status")?,
        created_at: column::<DateTime<Utc>>(row, entity, "created_at")?,
    })
}

fn grant_from_row(row: &PgRow) -> Result<AccessGrant, StoreError> {
    let entity = Entity::AccessGrant;
    Ok(AccessGrant {
        id: parsed(row, entity, "id")?,
        event_name: column(row, entity, "event_name")?,
        investor_email: column(row, entity, "investor_email")?,
        approved: column(row, entity, "approved")?,
        created_at: column::<DateTime<Utc>>(row, entity, "created_at")?,
    })
}

#[async_trait]
impl EntityStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, role, name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.name)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(Entity::User, || user.email.clone(), e))?;
        Ok(())
    }

    async fn find_user(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO events (
                id,
                name,
                description,
                image_url,
                event_datetime,
                terms_and_conditions,
                status,
                organiser_email,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.id.to_string())
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.image_url)
        .bind(event.event_datetime)
        .bind(&event.terms_and_conditions)
        .bind(event.status.as_str())
        .bind(&event.organiser_email)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(Entity::Event, || event.name.clone(), e))?;
        Ok(())
    }

    async fn find_event(&self, name: &str) -> Result<Option<Event>, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE name = $1");
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn list_events(&self, organiser_email: Option<&str>) -> Result<Vec<Event>, StoreError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE ($1::TEXT IS NULL OR organiser_email = $1) \
             ORDER BY event_datetime ASC, seq ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(organiser_email)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        rows.iter().map(event_from_row).collect()
    }

    async fn set_event_status(
        &self,
        name: &str,
        status: EventStatus,
    ) -> Result<Option<Event>, StoreError> {
        let sql = format!("UPDATE events SET status = $2 WHERE name = $1 RETURNING {EVENT_COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(name)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO enrollments (
                id,
                event_name,
                startup_email,
                idea_name,
                idea_description,
                team_details,
                status,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(enrollment.id.to_string())
        .bind(&enrollment.event_name)
        .bind(&enrollment.startup_email)
        .bind(&enrollment.idea_name)
        .bind(&enrollment.idea_description)
        .bind(&enrollment.team_details)
        .bind(enrollment.status.as_str())
        .bind(enrollment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            classify(
                Entity::Enrollment,
                || format!("{}/{}", enrollment.event_name, enrollment.startup_email),
                e,
            )
        })?;
        Ok(())
    }

    async fn find_enrollment(
        &self,
        event_name: &str,
        startup_email: &str,
    ) -> Result<Option<Enrollment>, StoreError> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
             WHERE event_name = $1 AND startup_email = $2"
        );
        let row = sqlx::query(&sql)
            .bind(event_name)
            .bind(startup_email)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.as_ref().map(enrollment_from_row).transpose()
    }

    async fn list_enrollments(
        &self,
        filter: EnrollmentFilter<'_>,
    ) -> Result<Vec<Enrollment>, StoreError> {
        let (column, value) = match filter {
            EnrollmentFilter::ByEvent(name) => ("event_name", name),
            EnrollmentFilter::ByStartup(email) => ("startup_email", email),
        };
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
             WHERE {column} = $1 \
             ORDER BY created_at DESC, seq DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        rows.iter().map(enrollment_from_row).collect()
    }

    async fn set_enrollment_status(
        &self,
        event_name: &str,
        startup_email: &str,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>, StoreError> {
        let sql = format!(
            "UPDATE enrollments SET status = $3 \
             WHERE event_name = $1 AND startup_email = $2 \
             RETURNING {ENROLLMENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(event_name)
            .bind(startup_email)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.as_ref().map(enrollment_from_row).transpose()
    }

    async fn insert_grant(&self, grant: &AccessGrant) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO investor_access (id, event_name, investor_email, approved, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(grant.id.to_string())
        .bind(&grant.event_name)
        .bind(&grant.investor_email)
        .bind(grant.approved)
        .bind(grant.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            classify(
                Entity::AccessGrant,
                || format!("{}/{}", grant.event_name, grant.investor_email),
                e,
            )
        })?;
        Ok(())
    }

    async fn find_grant(
        &self,
        event_name: &str,
        investor_email: &str,
    ) -> Result<Option<AccessGrant>, StoreError> {
        let sql = format!(
            "SELECT {GRANT_COLUMNS} FROM investor_access \
             WHERE event_name = $1 AND investor_email = $2"
        );
        let row = sqlx::query(&sql)
            .bind(event_name)
            .bind(investor_email)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.as_ref().map(grant_from_row).transpose()
    }

    async fn list_grants(&self, event_name: &str) -> Result<Vec<AccessGrant>, StoreError> {
        let sql = format!(
            "SELECT {GRANT_COLUMNS} FROM investor_access \
             WHERE event_name = $1 \
             ORDER BY created_at DESC, seq DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(event_name)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        rows.iter().map(grant_from_row).collect()
    }

    async fn set_grant_approved(
        &self,
        event_name: &str,
        investor_email: &str,
        approved: bool,
    ) -> Result<Option<AccessGrant>, StoreError> {
        let sql = format!(
            "UPDATE investor_access SET approved = $3 \
             WHERE event_name = $1 AND investor_email = $2 \
             RETURNING {GRANT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(event_name)
            .bind(investor_email)
            .bind(approved)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.as_ref().map(grant_from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            query_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            query_error(sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn test_row_not_found_is_query_error() {
        assert!(matches!(
            classify(Entity::Event, || "x".to_string(), sqlx::Error::RowNotFound),
            StoreError::Query(_)
        ));
    }
}
