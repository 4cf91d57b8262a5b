//! Persisted identity record and the rules route handlers apply to it.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_core::{DomainError, DomainResult, UserId};

use crate::{Principal, Role};

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Can authenticate.
    Active,
    /// Invited, has not completed onboarding.
    Pending,
    Suspended,
    /// Soft-deleted; the row stays for the audit trail.
    Deleted,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Pending => "pending",
            UserStatus::Suspended => "suspended",
            UserStatus::Deleted => "deleted",
        }
    }
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "pending" => Ok(UserStatus::Pending),
            "suspended" => Ok(UserStatus::Suspended),
            "deleted" => Ok(UserStatus::Deleted),
            other => Err(DomainError::validation(format!("unknown status '{other}'"))),
        }
    }
}

/// A row of the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Role as stored; parsed into [`Role`] when a principal is resolved.
    pub role: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Build a `pending` record for an invitation.
    pub fn invite(
        email: &str,
        first_name: &str,
        last_name: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(DomainError::validation("first and last name are required"));
        }

        Ok(Self {
            id: UserId::new(),
            email: email.to_lowercase(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            role: role.as_str().to_string(),
            status: UserStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// An admin may not demote their own account; changing anyone else's role,
/// including another admin's, is allowed.
pub fn ensure_role_change_allowed(actor: &Principal, target: UserId, new_role: Role) -> DomainResult<()> {
    if actor.id == target && actor.is_admin() && new_role != Role::Admin {
        return Err(DomainError::invariant("cannot demote your own account"));
    }
    Ok(())
}

/// Nobody may move their own account out of `active`.
pub fn ensure_status_change_allowed(actor: &Principal, target: UserId, new_status: UserStatus) -> DomainResult<()> {
    if actor.id == target && new_status != UserStatus::Active {
        return Err(DomainError::invariant("cannot deactivate your own account"));
    }
    Ok(())
}
