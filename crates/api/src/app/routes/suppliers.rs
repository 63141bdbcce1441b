use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
};
use chrono::Utc;

use galley_core::SupplierId;
use galley_infra::GalleyServices;
use galley_purchasing::NewSupplier;

use crate::app::routes::common::{parse_id, reply};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_supplier).get(list_suppliers))
        .route("/:id", delete(delete_supplier))
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<GalleyServices>>,
    Json(body): Json<NewSupplier>,
) -> axum::response::Response {
    reply(
        StatusCode::CREATED,
        services.purchasing.create_supplier(body, Utc::now()),
    )
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<GalleyServices>>,
) -> axum::response::Response {
    reply(StatusCode::OK, services.purchasing.list_suppliers())
}

/// Refused with 409 while items or purchases still reference the supplier.
pub async fn delete_supplier(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SupplierId = match parse_id("supplier", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.purchasing.delete_supplier(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => crate::app::errors::service_error_to_response(e),
    }
}
