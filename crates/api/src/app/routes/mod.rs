use axum::{middleware::from_fn_with_state, routing::get, Router};

use warden_auth::catalog;

use crate::app::services::AppServices;
use crate::authz::require_permission;

pub mod rbac;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router(services: &AppServices) -> Router {
    Router::new()
        .route("/me", get(system::whoami))
        .route(
            "/rbac/roles",
            get(rbac::list_roles).route_layer(from_fn_with_state(catalog::USER_READ, require_permission)),
        )
        .merge(users::router(services))
}
