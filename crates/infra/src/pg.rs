//! Shared sqlx error mapping.

use warden_auth::StoreError;

const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn store_error(e: sqlx::Error) -> StoreError {
    if let Some(db) = e.as_database_error() {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    match e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::unavailable(other.to_string()),
    }
}
