use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use warden_auth::{AuthError, Role, StoreError, UserStatus};
use warden_core::DomainError;

const AUTHENTICATION_REQUIRED: &str = "authentication required";

/// Map a pipeline failure to its HTTP response.
///
/// Every credential and eligibility failure shares one body so callers
/// cannot tell "expired" from "forged" or "unknown" from "suspended".
pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::MissingCredential | AuthError::InvalidCredential | AuthError::PrincipalNotEligible => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", AUTHENTICATION_REQUIRED)
        }
        AuthError::PermissionDenied(permission) => json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("missing permission '{permission}'"),
        ),
        AuthError::StoreUnavailable(e) => {
            tracing::error!(error = %e, "identity store unavailable");
            internal_error()
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::Unavailable(msg) => {
            tracing::error!(error = %msg, "store unavailable");
            internal_error()
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn internal_error() -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_role(s: &str) -> Result<Role, axum::response::Response> {
    s.parse::<Role>().map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_role",
            "role must be one of: admin, validator, viewer",
        )
    })
}

pub fn parse_status(s: &str) -> Result<UserStatus, axum::response::Response> {
    s.parse::<UserStatus>().map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_status",
            "status must be one of: active, pending, suspended, deleted",
        )
    })
}
