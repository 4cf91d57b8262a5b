//! User administration endpoints. Every route is permission-gated; the
//! mutating ones are audited.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::Utc;

use warden_auth::{
    catalog, ensure_role_change_allowed, ensure_status_change_allowed, StoreError, UserRecord, UserStatus,
};
use warden_core::UserId;
use warden_infra::mail::Invitation;

use crate::app::dto::{ChangeRoleRequest, ChangeStatusRequest, InviteUserRequest, UserResponse};
use crate::app::{errors, services::AppServices};
use crate::audit;
use crate::authz::require_permission;
use crate::context::PrincipalContext;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// The permission gate is added last so it wraps the audit step: denied
/// requests never reach the recorder.
pub fn router(services: &AppServices) -> Router {
    Router::new()
        .route(
            "/users",
            get(list_users).route_layer(from_fn_with_state(catalog::USER_READ, require_permission)),
        )
        .route(
            "/users/invite",
            post(invite_user)
                .route_layer(from_fn_with_state(services.audited("user.invite", "user"), audit::capture))
                .route_layer(from_fn_with_state(catalog::USER_INVITE, require_permission)),
        )
        .route(
            "/users/:id/role",
            patch(change_role)
                .route_layer(from_fn_with_state(services.audited("user.role_change", "user"), audit::capture))
                .route_layer(from_fn_with_state(catalog::USER_UPDATE, require_permission)),
        )
        .route(
            "/users/:id/status",
            patch(change_status)
                .route_layer(from_fn_with_state(services.audited("user.status_change", "user"), audit::capture))
                .route_layer(from_fn_with_state(catalog::USER_UPDATE, require_permission)),
        )
        .route(
            "/users/:id",
            get(get_user).route_layer(from_fn_with_state(catalog::USER_READ, require_permission)),
        )
        .route(
            "/users/:id",
            delete(delete_user)
                .route_layer(from_fn_with_state(services.audited("user.delete", "user"), audit::capture))
                .route_layer(from_fn_with_state(catalog::USER_DELETE, require_permission)),
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /users
pub async fn list_users(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.users.list().await {
        Ok(users) => {
            let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
            (StatusCode::OK, Json(serde_json::json!({ "users": users }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// GET /users/:id
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let target = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.users.get(target).await {
        Ok(Some(record)) => (StatusCode::OK, Json(UserResponse::from(&record))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /users/invite
///
/// Creates a `pending` record, then sends the invitation. If delivery fails
/// the record is removed again so no orphan account remains.
pub async fn invite_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Json(body): Json<InviteUserRequest>,
) -> axum::response::Response {
    let role = match errors::parse_role(&body.role) {
        Ok(role) => role,
        Err(resp) => return resp,
    };

    let record = match UserRecord::invite(&body.email, &body.first_name, &body.last_name, role, Utc::now()) {
        Ok(record) => record,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.users.insert(record.clone()).await {
        return errors::store_error_to_response(e);
    }

    let invitation = Invitation {
        to: record.email.clone(),
        display_name: record.display_name(),
        role,
        invited_by: ctx.principal().display_name.clone(),
    };

    if let Err(e) = services.mailer.send_invitation(&invitation).await {
        tracing::error!(error = %e, user_id = %record.id, "invitation delivery failed; removing pending user");
        if let Err(e) = services.users.remove(record.id).await {
            tracing::error!(error = %e, user_id = %record.id, "failed to remove pending user after delivery failure");
        }
        return errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "invitation_failed",
            "failed to send invitation",
        );
    }

    (StatusCode::CREATED, Json(UserResponse::from(&record))).into_response()
}

/// PATCH /users/:id/role
pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ChangeRoleRequest>,
) -> axum::response::Response {
    let target = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let role = match errors::parse_role(&body.role) {
        Ok(role) => role,
        Err(resp) => return resp,
    };

    if let Err(e) = ensure_role_change_allowed(ctx.principal(), target, role) {
        return errors::json_error(StatusCode::BAD_REQUEST, "cannot_demote_self", e.to_string());
    }

    match services.users.update_role(target, role, Utc::now()).await {
        Ok(record) => (StatusCode::OK, Json(UserResponse::from(&record))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// PATCH /users/:id/status
pub async fn change_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ChangeStatusRequest>,
) -> axum::response::Response {
    let target = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let status = match errors::parse_status(&body.status) {
        Ok(status) => status,
        Err(resp) => return resp,
    };

    if let Err(e) = ensure_status_change_allowed(ctx.principal(), target, status) {
        return errors::json_error(StatusCode::BAD_REQUEST, "cannot_deactivate_self", e.to_string());
    }

    update_status(&services, target, status).await
}

/// DELETE /users/:id
///
/// Soft delete: the record stays with status `deleted` and can no longer
/// authenticate.
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let target = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    if ensure_status_change_allowed(ctx.principal(), target, UserStatus::Deleted).is_err() {
        return errors::json_error(StatusCode::BAD_REQUEST, "cannot_delete_self", "cannot delete your own account");
    }

    update_status(&services, target, UserStatus::Deleted).await
}

async fn update_status(services: &AppServices, target: UserId, status: UserStatus) -> axum::response::Response {
    match services.users.update_status(target, status, Utc::now()).await {
        Ok(record) => (StatusCode::OK, Json(UserResponse::from(&record))).into_response(),
        Err(StoreError::NotFound) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, axum::response::Response> {
    raw.parse::<UserId>().map_err(errors::domain_error_to_response)
}
