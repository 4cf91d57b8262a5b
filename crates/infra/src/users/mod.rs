//! Identity/user store adapters.
//!
//! `UserDirectory` is the read/write surface the user-management routes need;
//! it extends the per-request `IdentityStore` read port from `warden-auth`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warden_auth::{IdentityStore, Role, StoreError, UserRecord, UserStatus};
use warden_core::UserId;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;

#[async_trait]
pub trait UserDirectory: IdentityStore {
    async fn get(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Insert a new record; duplicate email is a `Conflict`.
    async fn insert(&self, record: UserRecord) -> Result<(), StoreError>;

    async fn update_role(&self, id: UserId, role: Role, now: DateTime<Utc>) -> Result<UserRecord, StoreError>;

    async fn update_status(
        &self,
        id: UserId,
        status: UserStatus,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, StoreError>;

    /// Hard delete. Only used to compensate a half-finished invitation; routine
    /// removal goes through `update_status(.., Deleted, ..)`.
    async fn remove(&self, id: UserId) -> Result<(), StoreError>;
}
