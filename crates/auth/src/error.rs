use thiserror::Error;

use crate::Permission;

/// Failures of the authentication/authorization pipeline.
///
/// The credential and eligibility variants intentionally carry no detail:
/// "expired" and "forged" are the same outcome, as are "unknown" and
/// "suspended".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,

    #[error("invalid credential")]
    InvalidCredential,

    #[error("principal not eligible")]
    PrincipalNotEligible,

    #[error("permission denied: missing '{0}'")]
    PermissionDenied(Permission),

    /// The identity store could not answer at all.
    #[error("identity store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Errors reported by storage ports.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
