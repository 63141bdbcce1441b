use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use serde_json::json;

use galley_core::InventoryItemId;
use galley_infra::{GalleyServices, ServiceResult, StockService};
use galley_inventory::{ItemPatch, NewItem, ReferenceKind};

use crate::app::dto;
use crate::app::routes::common::{parse_id, reply};
use crate::context::Actor;

pub fn router() -> Router {
    Router::new()
        .route("/items", post(create_item).get(list_items))
        .route("/items/bulk-adjust", post(bulk_adjust))
        .route(
            "/items/:id",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/items/:id/adjust", post(adjust_stock))
        .route("/items/:id/transactions", get(list_transactions))
        .route("/items/:id/ledger-balance", get(ledger_balance))
        .route("/alerts", get(alerts))
}

pub async fn create_item(
    Extension(services): Extension<Arc<GalleyServices>>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<NewItem>,
) -> axum::response::Response {
    reply(
        StatusCode::CREATED,
        services.stock.create_item(body, actor.name(), Utc::now()),
    )
}

pub async fn list_items(
    Extension(services): Extension<Arc<GalleyServices>>,
    Query(query): Query<dto::ItemListQuery>,
) -> axum::response::Response {
    let today = Utc::now().date_naive();
    reply(
        StatusCode::OK,
        services.stock.list_items(&query.into(), today),
    )
}

pub async fn get_item(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InventoryItemId = match parse_id("item", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    reply(StatusCode::OK, services.stock.get_item(id))
}

pub async fn update_item(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
    Json(patch): Json<ItemPatch>,
) -> axum::response::Response {
    let id: InventoryItemId = match parse_id("item", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    reply(
        StatusCode::OK,
        services.stock.update_item(id, patch, Utc::now()),
    )
}

/// Soft delete; the ledger is kept.
pub async fn delete_item(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InventoryItemId = match parse_id("item", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    reply(StatusCode::OK, services.stock.delete_item(id, Utc::now()))
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<GalleyServices>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let id: InventoryItemId = match parse_id("item", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let cmd = body.into_command(id, ReferenceKind::Manual, &actor, Utc::now());
    reply(StatusCode::OK, services.stock.adjust_stock(cmd))
}

/// Partial success: inspect both `applied` and `errors`.
pub async fn bulk_adjust(
    Extension(services): Extension<Arc<GalleyServices>>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<dto::BulkAdjustRequest>,
) -> axum::response::Response {
    let now = Utc::now();
    let cmds = body
        .items
        .into_iter()
        .map(|line| {
            line.adjustment
                .into_command(line.item_id, ReferenceKind::Bulk, &actor, now)
        })
        .collect();
    reply(StatusCode::OK, Ok(services.stock.bulk_adjust(cmds)))
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::TransactionQuery>,
) -> axum::response::Response {
    let id: InventoryItemId = match parse_id("item", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    reply(
        StatusCode::OK,
        services.stock.list_transactions(id, &query.into()),
    )
}

pub async fn ledger_balance(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InventoryItemId = match parse_id("item", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let result = services.stock.get_item(id).and_then(|item| {
        let balance = services.stock.ledger_balance(id)?;
        Ok(json!({
            "item_id": id,
            "current_stock": item.current_stock(),
            "ledger_balance": balance,
        }))
    });
    reply(StatusCode::OK, result)
}

pub async fn alerts(
    Extension(services): Extension<Arc<GalleyServices>>,
    Query(query): Query<dto::AlertQuery>,
) -> axum::response::Response {
    let today = Utc::now().date_naive();
    let days = query.days.unwrap_or(dto::DEFAULT_EXPIRY_WINDOW_DAYS);
    let result = alert_report(&services.stock, today, days);
    reply(StatusCode::OK, result)
}

fn alert_report(stock: &StockService, today: NaiveDate, days: u32) -> ServiceResult<serde_json::Value> {
    Ok(json!({
        "summary": stock.alert_summary(today, days)?,
        "low_stock": stock.low_stock()?,
        "out_of_stock": stock.out_of_stock()?,
        "expiring_soon": stock.expiring_soon(today, days)?,
        "expired": stock.expired(today)?,
    }))
}
