//! Read-only view of the role table.

use axum::{http::StatusCode, response::IntoResponse, Json};

use warden_auth::role_matrix;

/// GET /rbac/roles - every role with its granted permissions.
pub async fn list_roles() -> axum::response::Response {
    (StatusCode::OK, Json(serde_json::json!({ "roles": role_matrix() }))).into_response()
}
