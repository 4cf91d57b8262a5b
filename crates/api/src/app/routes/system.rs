use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use warden_auth::role_permissions;

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// The resolved principal and its effective permissions.
pub async fn whoami(Extension(ctx): Extension<PrincipalContext>) -> impl IntoResponse {
    let principal = ctx.principal();
    let permissions: Vec<&str> = principal
        .role
        .map(|role| role_permissions(role).iter().map(|p| p.as_str()).collect())
        .unwrap_or_default();

    Json(serde_json::json!({
        "id": principal.id.to_string(),
        "email": principal.email,
        "display_name": principal.display_name,
        "role": principal.role.map(|r| r.as_str()),
        "status": principal.status.as_str(),
        "permissions": permissions,
    }))
}
