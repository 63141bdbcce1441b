use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use galley_core::WasteId;
use galley_infra::GalleyServices;
use galley_waste::{NewWaste, WasteFilter, WastePatch};

use crate::app::routes::common::{parse_id, reply};
use crate::context::Actor;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_waste).get(list_waste))
        .route("/bulk", post(bulk_import))
        .route("/cost", get(cost_total))
        .route(
            "/:id",
            get(get_waste).patch(update_waste).delete(delete_waste),
        )
}

#[derive(Debug, Deserialize)]
pub struct BulkWasteRequest {
    pub records: Vec<NewWaste>,
}

fn stamp(mut cmd: NewWaste, actor: &Actor) -> NewWaste {
    cmd.recorded_by = cmd.recorded_by.or_else(|| actor.name());
    cmd
}

pub async fn create_waste(
    Extension(services): Extension<Arc<GalleyServices>>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<NewWaste>,
) -> axum::response::Response {
    reply(
        StatusCode::CREATED,
        services.waste.create_waste(stamp(body, &actor), Utc::now()),
    )
}

/// Records are imported one by one; failures are listed in `errors`.
pub async fn bulk_import(
    Extension(services): Extension<Arc<GalleyServices>>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<BulkWasteRequest>,
) -> axum::response::Response {
    let records = body.records.into_iter().map(|r| stamp(r, &actor)).collect();
    reply(
        StatusCode::OK,
        Ok(services.waste.bulk_import(records, Utc::now())),
    )
}

pub async fn list_waste(
    Extension(services): Extension<Arc<GalleyServices>>,
    Query(filter): Query<WasteFilter>,
) -> axum::response::Response {
    reply(StatusCode::OK, services.waste.list_waste(&filter))
}

pub async fn cost_total(
    Extension(services): Extension<Arc<GalleyServices>>,
    Query(filter): Query<WasteFilter>,
) -> axum::response::Response {
    let result = services
        .waste
        .cost_total(&filter)
        .map(|total| json!({ "total_cost": total }));
    reply(StatusCode::OK, result)
}

pub async fn get_waste(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WasteId = match parse_id("waste", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    reply(StatusCode::OK, services.waste.get_waste(id))
}

/// A quantity change rewrites the original ledger row in place.
pub async fn update_waste(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
    Json(patch): Json<WastePatch>,
) -> axum::response::Response {
    let id: WasteId = match parse_id("waste", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    reply(
        StatusCode::OK,
        services.waste.update_waste(id, patch, Utc::now()),
    )
}

/// Stock comes back through a new `adjustment` row.
pub async fn delete_waste(
    Extension(services): Extension<Arc<GalleyServices>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WasteId = match parse_id("waste", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    reply(
        StatusCode::OK,
        services.waste.delete_waste(id, actor.name(), Utc::now()),
    )
}
