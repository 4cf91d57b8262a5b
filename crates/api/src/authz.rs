//! Per-route permission gate.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use warden_auth::{authorize, Permission};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Route layer requiring `required`; install with
/// `from_fn_with_state(catalog::USER_DELETE, require_permission)`.
///
/// Reaching this without a resolved principal is a wiring fault, not a
/// client error.
pub async fn require_permission(
    State(required): State<Permission>,
    req: Request,
    next: Next,
) -> Response {
    let Some(ctx) = req.extensions().get::<PrincipalContext>() else {
        tracing::error!(permission = %required, "permission gate reached without a principal");
        return errors::internal_error();
    };

    if let Err(e) = authorize(ctx.principal(), &required) {
        tracing::info!(
            principal_id = %ctx.principal_id(),
            permission = %required,
            "permission denied"
        );
        return errors::auth_error_to_response(e);
    }

    next.run(req).await
}
