//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and their mapping onto service commands
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use galley_infra::{GalleyServices, ServiceResult};

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router with freshly wired services.
pub fn build_app(config: &ApiConfig) -> ServiceResult<Router> {
    let services = Arc::new(GalleyServices::new(config.galley.clone())?);
    Ok(router_with(services))
}

/// Router over existing services; lets a caller keep a handle on them.
pub fn router_with(services: Arc<GalleyServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::actor_middleware))
                .layer(Extension(services)),
        )
}
