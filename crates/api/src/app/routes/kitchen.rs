use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use chrono::Utc;
use serde_json::json;

use galley_core::RecipeId;
use galley_infra::GalleyServices;
use galley_kitchen::Worker;

use crate::app::dto;
use crate::app::errors;
use crate::app::routes::common::{parse_id, reply};

pub fn router() -> Router {
    Router::new()
        .route("/board", get(board))
        .route("/roster", get(roster))
        .route("/roster/chefs", post(add_chef))
        .route("/roster/chefs/:name", delete(remove_chef))
        .route("/roster/stations", post(add_station))
        .route("/roster/stations/:name", delete(remove_station))
        .route("/roster/tables", post(add_table))
        .route("/roster/tables/:number", delete(remove_table))
        .route("/workload/:worker/:name", get(workload))
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", put(upsert_recipe))
}

/// Non-completed orders with their current priority. Meant to be polled.
pub async fn board(
    Extension(services): Extension<Arc<GalleyServices>>,
    Query(query): Query<dto::BoardQuery>,
) -> axum::response::Response {
    reply(
        StatusCode::OK,
        services
            .kitchen
            .kitchen_board(query.sort.unwrap_or_default(), Utc::now()),
    )
}

pub async fn roster(
    Extension(services): Extension<Arc<GalleyServices>>,
) -> axum::response::Response {
    reply(StatusCode::OK, services.kitchen.roster())
}

pub async fn add_chef(
    Extension(services): Extension<Arc<GalleyServices>>,
    Json(body): Json<dto::RosterMemberRequest>,
) -> axum::response::Response {
    reply(
        StatusCode::CREATED,
        services.kitchen.add_to_roster(Worker::Chef, &body.name),
    )
}

pub async fn remove_chef(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    reply(
        StatusCode::OK,
        services.kitchen.remove_from_roster(Worker::Chef, &name),
    )
}

pub async fn add_station(
    Extension(services): Extension<Arc<GalleyServices>>,
    Json(body): Json<dto::RosterMemberRequest>,
) -> axum::response::Response {
    reply(
        StatusCode::CREATED,
        services.kitchen.add_to_roster(Worker::Station, &body.name),
    )
}

pub async fn remove_station(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    reply(
        StatusCode::OK,
        services.kitchen.remove_from_roster(Worker::Station, &name),
    )
}

pub async fn add_table(
    Extension(services): Extension<Arc<GalleyServices>>,
    Json(body): Json<dto::TableRequest>,
) -> axum::response::Response {
    reply(
        StatusCode::CREATED,
        services.kitchen.add_table(body.table_number),
    )
}

pub async fn remove_table(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(number): Path<u32>,
) -> axum::response::Response {
    reply(StatusCode::OK, services.kitchen.remove_table(number))
}

pub async fn workload(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path((worker, name)): Path<(String, String)>,
) -> axum::response::Response {
    let worker = match worker.as_str() {
        "chef" | "chefs" => Worker::Chef,
        "station" | "stations" => Worker::Station,
        _ => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "worker must be one of: chef, station",
            );
        }
    };
    let result = services
        .kitchen
        .workload(worker, &name)
        .map(|count| json!({ "name": name, "active_orders": count }));
    reply(StatusCode::OK, result)
}

pub async fn list_recipes(
    Extension(services): Extension<Arc<GalleyServices>>,
) -> axum::response::Response {
    reply(StatusCode::OK, services.recipes.list())
}

pub async fn upsert_recipe(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RecipeRequest>,
) -> axum::response::Response {
    let id: RecipeId = match parse_id("recipe", &id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let recipe = body.into_recipe(id);
    let result = services.recipes.upsert(recipe.clone()).map(|()| recipe);
    reply(StatusCode::OK, result)
}
