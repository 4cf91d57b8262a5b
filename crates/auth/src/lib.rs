//! `warden-auth` — request authentication/authorization boundary.
//!
//! Token verification, identity resolution against live state, the static
//! role→permission table, and the audit trail model. Decoupled from HTTP;
//! storage is reached only through the `IdentityStore` and `AuditStore` ports.

pub mod audit;
pub mod authorize;
pub mod claims;
pub mod error;
pub mod permissions;
pub mod principal;
pub mod resolver;
pub mod roles;
pub mod user;
pub mod verifier;

pub use audit::{AuditEntry, AuditStore};
pub use authorize::{allowed, authorize, role_matrix, role_permissions, RoleDefinition};
pub use claims::{validate_claims, TokenClaims, TokenValidationError};
pub use error::{AuthError, StoreError};
pub use permissions::{catalog, Permission};
pub use principal::Principal;
pub use resolver::{IdentityResolver, IdentityStore};
pub use roles::{Role, UnknownRole};
pub use user::{ensure_role_change_allowed, ensure_status_change_allowed, UserRecord, UserStatus};
pub use verifier::{extract_bearer, CredentialVerifier, IssueError, TOKEN_TTL};
