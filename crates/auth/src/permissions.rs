use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque `resource.action` strings (e.g. "user.delete").
/// They are not stored anywhere; the set of meaningful permissions is exactly
/// what the role table grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Well-known permissions referenced by routes and the role table.
pub mod catalog {
    use super::Permission;

    pub const USER_READ: Permission = Permission::from_static("user.read");
    pub const USER_INVITE: Permission = Permission::from_static("user.invite");
    pub const USER_UPDATE: Permission = Permission::from_static("user.update");
    pub const USER_DELETE: Permission = Permission::from_static("user.delete");

    pub const BUSINESS_READ: Permission = Permission::from_static("business.read");
    pub const BUSINESS_CREATE: Permission = Permission::from_static("business.create");
    pub const BUSINESS_UPDATE: Permission = Permission::from_static("business.update");
    pub const BUSINESS_DELETE: Permission = Permission::from_static("business.delete");

    pub const DOCUMENT_READ: Permission = Permission::from_static("document.read");
    pub const DOCUMENT_UPLOAD: Permission = Permission::from_static("document.upload");
    pub const DOCUMENT_VALIDATE: Permission = Permission::from_static("document.validate");
    pub const DOCUMENT_DELETE: Permission = Permission::from_static("document.delete");

    pub const AUDIT_READ: Permission = Permission::from_static("audit.read");
}
