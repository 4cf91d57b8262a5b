use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warden_auth::{IdentityStore, Role, StoreError, UserRecord, UserStatus};
use warden_core::UserId;

use super::UserDirectory;

/// In-memory identity store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly (bootstrap admin, tests).
    pub fn seed(&self, record: UserRecord) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(record.id, record);
        }
    }

    fn update<F>(&self, id: UserId, now: DateTime<Utc>, f: F) -> Result<UserRecord, StoreError>
    where
        F: FnOnce(&mut UserRecord),
    {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let record = map.get_mut(&id).ok_or(StoreError::NotFound)?;
        f(record);
        record.updated_at = now;
        Ok(record.clone())
    }
}

fn poisoned() -> StoreError {
    StoreError::unavailable("user store lock poisoned")
}

#[async_trait]
impl IdentityStore for InMemoryUserStore {
    async fn find_active(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .get(&id)
            .filter(|r| r.status == UserStatus::Active)
            .cloned())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserStore {
    async fn get(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut users: Vec<UserRecord> = map.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.email.cmp(&b.email)));
        Ok(users)
    }

    async fn insert(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.values().any(|r| r.email == record.email) {
            return Err(StoreError::Conflict(format!("email '{}' already registered", record.email)));
        }
        map.insert(record.id, record);
        Ok(())
    }

    async fn update_role(&self, id: UserId, role: Role, now: DateTime<Utc>) -> Result<UserRecord, StoreError> {
        self.update(id, now, |r| r.role = role.as_str().to_string())
    }

    async fn update_status(
        &self,
        id: UserId,
        status: UserStatus,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, StoreError> {
        self.update(id, now, |r| r.status = status)
    }

    async fn remove(&self, id: UserId) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}
