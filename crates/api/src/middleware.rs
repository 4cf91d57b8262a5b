//! Authentication: credential verification followed by identity resolution.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use warden_auth::{CredentialVerifier, IdentityResolver};

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: CredentialVerifier,
    pub resolver: IdentityResolver,
}

/// Verify the bearer token, re-derive the principal from the identity store,
/// and attach it to the request. Short-circuits before any handler runs.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    // A header that is not visible ASCII is treated like no header at all.
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let claims = match state.verifier.verify(header) {
        Ok(claims) => claims,
        Err(e) => return errors::auth_error_to_response(e),
    };

    let principal = match state.resolver.resolve(&claims).await {
        Ok(principal) => principal,
        Err(e) => return errors::auth_error_to_response(e),
    };

    req.extensions_mut().insert(PrincipalContext::new(principal));

    next.run(req).await
}
