use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::EventStore;
use crate::access::{Role, AUTHENTICATED_INSERT, PUBLIC_INSERT};
use crate::models::{Event, NewEvent};
use crate::utils::error::AppError;

const INSERT_EVENT: &str = r#"
    INSERT INTO events (start_date, end_date, city, brand, theme, description)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, start_date, end_date, city, brand, theme, description, created_at
"#;

const SELECT_EVENTS: &str = r#"
    SELECT id, start_date, end_date, city, brand, theme, description, created_at
    FROM events
    ORDER BY id ASC
"#;

// SQLSTATE codes surfaced by RLS and NOT NULL checks.
const INSUFFICIENT_PRIVILEGE: &str = "42501";
const NOT_NULL_VIOLATION: &str = "23502";

/// Postgres-backed store. Every statement runs inside a transaction that
/// has switched to the caller's database role, so row-level security in
/// the database applies on top of the service's own policy check.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin_as(&self, role: Role) -> Result<Transaction<'static, Postgres>, AppError> {
        let mut tx = self.pool.begin().await?;
        // Role names come from a closed enum, never from request input.
        let statement = format!("SET LOCAL ROLE {}", role.as_str());
        sqlx::query(&statement).execute(&mut *tx).await?;
        Ok(tx)
    }

    /// One-time administrative migration from the quick-start policy set to
    /// the production one: only authenticated callers may insert afterwards.
    pub async fn harden_insert_policy(pool: &PgPool) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(&format!(r#"DROP POLICY IF EXISTS "{}" ON events"#, PUBLIC_INSERT))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(r#"DROP POLICY IF EXISTS "{}" ON events"#, AUTHENTICATED_INSERT))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            r#"CREATE POLICY "{}" ON events FOR INSERT WITH CHECK (current_user = '{}')"#,
            AUTHENTICATED_INSERT,
            Role::Authenticated.as_str()
        ))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(policy = AUTHENTICATED_INSERT, "Insert policy hardened");
        Ok(())
    }

    /// Names of the INSERT policies currently installed on `events`.
    pub async fn insert_policies(&self) -> Result<Vec<String>, AppError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT policyname::text FROM pg_policies WHERE tablename = 'events' AND cmd = 'INSERT'",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }
}

fn map_db_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some(INSUFFICIENT_PRIVILEGE) => {
                return AppError::Forbidden(format!("Permission denied: {}", db.message()));
            }
            Some(NOT_NULL_VIOLATION) => {
                return AppError::ValidationError(db.message().to_string());
            }
            _ => {}
        }
    }
    AppError::DatabaseError(err)
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, role: Role, event: NewEvent) -> Result<Event, AppError> {
        let mut tx = self.begin_as(role).await?;

        let stored = sqlx::query_as::<_, Event>(INSERT_EVENT)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(event.city)
            .bind(event.brand)
            .bind(event.theme)
            .bind(event.description)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await?;
        Ok(stored)
    }

    async fn list(&self, role: Role) -> Result<Vec<Event>, AppError> {
        let mut tx = self.begin_as(role).await?;

        let rows = sqlx::query_as::<_, Event>(SELECT_EVENTS)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await?;
        Ok(rows)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
