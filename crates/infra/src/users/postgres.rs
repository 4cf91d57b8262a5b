//! Postgres-backed identity store.
//!
//! Expects a `users` table with columns `id uuid`, `email text unique`,
//! `first_name text`, `last_name text`, `role text`, `status text`,
//! `created_at timestamptz`, `updated_at timestamptz`. The schema itself is
//! managed outside this crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use warden_auth::{IdentityStore, Role, StoreError, UserRecord, UserStatus};
use warden_core::UserId;

use super::UserDirectory;
use crate::pg::store_error;

const COLUMNS: &str = "id, email, first_name, last_name, role, status, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &PgRow) -> Result<UserRecord, StoreError> {
    let status: String = row.try_get("status").map_err(store_error)?;
    let status = status
        .parse::<UserStatus>()
        .map_err(|e| StoreError::unavailable(format!("corrupt users.status: {e}")))?;

    Ok(UserRecord {
        id: UserId::from_uuid(row.try_get("id").map_err(store_error)?),
        email: row.try_get("email").map_err(store_error)?,
        first_name: row.try_get("first_name").map_err(store_error)?,
        last_name: row.try_get("last_name").map_err(store_error)?,
        role: row.try_get("role").map_err(store_error)?,
        status,
        created_at: row.try_get("created_at").map_err(store_error)?,
        updated_at: row.try_get("updated_at").map_err(store_error)?,
    })
}

#[async_trait]
impl IdentityStore for PostgresUserStore {
    async fn find_active(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM users WHERE id = $1 AND status = 'active'"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.as_ref().map(row_to_record).transpose()
    }
}

#[async_trait]
impl UserDirectory for PostgresUserStore {
    async fn get(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM users ORDER BY created_at, email"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.iter().map(row_to_record).collect()
    }

    async fn insert(&self, record: UserRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, first_name, last_name, role, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.email)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.role)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn update_role(&self, id: UserId, role: Role, now: DateTime<Utc>) -> Result<UserRecord, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE users SET role = $2, updated_at = $3 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(role.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .ok_or(StoreError::NotFound)?;

        row_to_record(&row)
    }

    async fn update_status(
        &self,
        id: UserId,
        status: UserStatus,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE users SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .ok_or(StoreError::NotFound)?;

        row_to_record(&row)
    }

    async fn remove(&self, id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
