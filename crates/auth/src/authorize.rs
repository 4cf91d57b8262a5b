//! Permission Evaluator: the static role→permission table.
//!
//! - No IO
//! - No panics
//! - Deny by default: anything not listed is refused

use serde::Serialize;

use crate::permissions::catalog::*;
use crate::{AuthError, Permission, Principal, Role};

const ADMIN: &[Permission] = &[
    USER_READ,
    USER_INVITE,
    USER_UPDATE,
    USER_DELETE,
    BUSINESS_READ,
    BUSINESS_CREATE,
    BUSINESS_UPDATE,
    BUSINESS_DELETE,
    DOCUMENT_READ,
    DOCUMENT_UPLOAD,
    DOCUMENT_VALIDATE,
    DOCUMENT_DELETE,
    AUDIT_READ,
];

const VALIDATOR: &[Permission] = &[
    USER_READ,
    BUSINESS_READ,
    DOCUMENT_READ,
    DOCUMENT_UPLOAD,
    DOCUMENT_VALIDATE,
];

const VIEWER: &[Permission] = &[BUSINESS_READ, DOCUMENT_READ];

/// Permissions held by a role.
pub fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => ADMIN,
        Role::Validator => VALIDATOR,
        Role::Viewer => VIEWER,
    }
}

/// Decide whether `role` holds `permission`.
///
/// `None` stands for a role that could not be established (unknown or
/// missing in the stored record); it holds nothing.
pub fn allowed(role: Option<Role>, permission: &Permission) -> bool {
    match role {
        Some(role) => role_permissions(role).contains(permission),
        None => false,
    }
}

/// Authorize a resolved principal for one permission.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthError> {
    if allowed(principal.role, required) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied(required.clone()))
    }
}

/// A role and the permissions it grants (for introspection endpoints).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub permissions: Vec<String>,
}

/// The whole table, roles in declaration order, permissions sorted.
pub fn role_matrix() -> Vec<RoleDefinition> {
    Role::ALL
        .iter()
        .map(|role| {
            let mut permissions: Vec<String> = role_permissions(*role)
                .iter()
                .map(|p| p.as_str().to_string())
                .collect();
            permissions.sort();
            RoleDefinition {
                name: role.as_str(),
                description: role_description(*role),
                permissions,
            }
        })
        .collect()
}

fn role_description(role: Role) -> &'static str {
    match role {
        Role::Admin => "Full administrator: user management and every business/document action",
        Role::Validator => "Reviews and validates uploaded documents",
        Role::Viewer => "Read-only access to businesses and documents",
    }
}
