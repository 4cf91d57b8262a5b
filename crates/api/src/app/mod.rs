//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, verifier, resolver, mailer, audit recorder
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{build_services, AppServices};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// audit step can fall back to the peer address.
pub fn build_app(services: AppServices) -> Router {
    let auth_state = middleware::AuthState {
        verifier: services.verifier.clone(),
        resolver: services.resolver.clone(),
    };

    // Protected routes: every request is authenticated and resolved first.
    let protected = routes::router(&services).layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            ))
            .layer(Extension(Arc::new(services))),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
