use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;

use galley_core::OrderId;
use galley_infra::GalleyServices;
use galley_kitchen::NewOrder;

use crate::app::dto;
use crate::app::routes::common::{parse_id, reply};
use crate::context::Actor;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", post(set_status))
        .route("/:id/complete", post(complete_order))
        .route("/:id/assign", post(assign))
        .route("/:id/auto-assign", post(auto_assign))
        .route("/:id/unassign", post(unassign))
        .route("/:id/urgent", post(toggle_urgent))
        .route("/:id/deduct-stock", post(deduct_stock))
}

macro_rules! order_id {
    ($raw:expr) => {
        match parse_id::<OrderId>("order", &$raw) {
            Ok(id) => id,
            Err(resp) => return resp,
        }
    };
}

pub async fn create_order(
    Extension(services): Extension<Arc<GalleyServices>>,
    Json(body): Json<NewOrder>,
) -> axum::response::Response {
    reply(
        StatusCode::CREATED,
        services.kitchen.create_order(body, Utc::now()),
    )
}

pub async fn list_orders(
    Extension(services): Extension<Arc<GalleyServices>>,
    Query(query): Query<dto::OrderListQuery>,
) -> axum::response::Response {
    reply(StatusCode::OK, services.kitchen.list_orders(query.status))
}

pub async fn get_order(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = order_id!(id);
    reply(StatusCode::OK, services.kitchen.get_order(id))
}

pub async fn set_status(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetOrderStatusRequest>,
) -> axum::response::Response {
    let id = order_id!(id);
    reply(
        StatusCode::OK,
        services.kitchen.set_status(id, body.status, Utc::now()),
    )
}

pub async fn complete_order(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = order_id!(id);
    reply(StatusCode::OK, services.kitchen.complete_order(id, Utc::now()))
}

pub async fn assign(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AssignRequest>,
) -> axum::response::Response {
    let id = order_id!(id);
    reply(
        StatusCode::OK,
        services
            .kitchen
            .assign(id, &body.chef, &body.station, Utc::now()),
    )
}

/// 409 when no chef or station has spare capacity.
pub async fn auto_assign(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = order_id!(id);
    reply(StatusCode::OK, services.kitchen.auto_assign(id, Utc::now()))
}

pub async fn unassign(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = order_id!(id);
    reply(StatusCode::OK, services.kitchen.unassign(id, Utc::now()))
}

pub async fn toggle_urgent(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = order_id!(id);
    reply(StatusCode::OK, services.kitchen.toggle_urgent(id, Utc::now()))
}

/// Best effort: ingredients with no matching item are listed in
/// `unmatched` and leave stock untouched.
pub async fn deduct_stock(
    Extension(services): Extension<Arc<GalleyServices>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = order_id!(id);
    reply(
        StatusCode::OK,
        services
            .kitchen
            .deduct_stock_from_order(id, actor.name(), Utc::now()),
    )
}
