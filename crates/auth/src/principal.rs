use serde::Serialize;

use warden_core::UserId;

use crate::{Role, UserRecord, UserStatus};

/// The authenticated caller attached to a request.
///
/// Built fresh per request from a verified claim plus a point-in-time store
/// read; never cached across requests. `status` is always `Active` for a
/// principal produced by [`crate::IdentityResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    /// `None` when the stored role is not one this build knows; such a
    /// principal is denied every permission.
    pub role: Option<Role>,
    pub status: UserStatus,
    pub display_name: String,
}

impl Principal {
    pub fn from_record(record: &UserRecord) -> Self {
        let role = match record.role.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                tracing::warn!(user_id = %record.id, error = %e, "stored role not recognised; denying all permissions");
                None
            }
        };

        Self {
            id: record.id,
            email: record.email.clone(),
            role,
            status: record.status,
            display_name: record.display_name(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}
