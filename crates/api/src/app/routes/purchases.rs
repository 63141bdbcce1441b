use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;

use galley_core::PurchaseId;
use galley_infra::{CreatePurchase, GalleyServices, PurchaseFilter, SetPurchaseStatus};

use crate::app::dto;
use crate::app::routes::common::{parse_id, reply};
use crate::context::Actor;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_purchase).get(list_purchases))
        .route("/:id", get(get_purchase))
        .route("/:id/status", post(set_status))
        .route("/:id/receive", post(receive_items))
}

pub async fn create_purchase(
    Extension(services): Extension<Arc<GalleyServices>>,
    Json(body): Json<CreatePurchase>,
) -> axum::response::Response {
    reply(
        StatusCode::CREATED,
        services.purchasing.create_purchase(body, Utc::now()),
    )
}

pub async fn list_purchases(
    Extension(services): Extension<Arc<GalleyServices>>,
    Query(filter): Query<PurchaseFilter>,
) -> axum::response::Response {
    reply(StatusCode::OK, services.purchasing.list_purchases(&filter))
}

pub async fn get_purchase(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PurchaseId = match parse_id("purchase", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    reply(StatusCode::OK, services.purchasing.get_purchase(id))
}

/// Moving to `delivered` receives every outstanding remainder first.
pub async fn set_status(
    Extension(services): Extension<Arc<GalleyServices>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(mut body): Json<SetPurchaseStatus>,
) -> axum::response::Response {
    let id: PurchaseId = match parse_id("purchase", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    body.received_by = body.received_by.or_else(|| actor.name());
    reply(
        StatusCode::OK,
        services.purchasing.set_status(id, body, Utc::now()),
    )
}

/// Each line is applied on its own; check `lines.errors`.
pub async fn receive_items(
    Extension(services): Extension<Arc<GalleyServices>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReceiveItemsRequest>,
) -> axum::response::Response {
    let id: PurchaseId = match parse_id("purchase", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let received_by = body.received_by.or_else(|| actor.name());
    reply(
        StatusCode::OK,
        services
            .purchasing
            .receive_items(id, body.items, received_by, Utc::now()),
    )
}
