use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};
use serde_json::{Map, Value};

use galley_infra::{GalleyServices, SettingValue};

use crate::app::routes::common::reply;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_settings))
        .route("/:key", get(get_setting).put(put_setting))
}

pub async fn list_settings(
    Extension(services): Extension<Arc<GalleyServices>>,
) -> axum::response::Response {
    let result = services.settings.list().map(|pairs| {
        let mut out = Map::new();
        for (key, value) in pairs {
            out.insert(key, serde_json::to_value(value).unwrap_or(Value::Null));
        }
        Value::Object(out)
    });
    reply(StatusCode::OK, result)
}

pub async fn get_setting(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(key): Path<String>,
) -> axum::response::Response {
    let result = services.settings.get(&key).and_then(|value| {
        value.ok_or_else(|| galley_infra::ServiceError::not_found(format!("setting {key}")))
    });
    reply(StatusCode::OK, result)
}

/// Pricing keys take effect on the next order placed.
pub async fn put_setting(
    Extension(services): Extension<Arc<GalleyServices>>,
    Path(key): Path<String>,
    Json(value): Json<SettingValue>,
) -> axum::response::Response {
    let result = services
        .settings
        .set(key, value.clone())
        .map(|()| value);
    reply(StatusCode::OK, result)
}
