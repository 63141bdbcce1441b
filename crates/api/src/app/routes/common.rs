use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use uuid::Uuid;

use galley_infra::ServiceResult;

use crate::app::errors;

/// Serialize a service result, or map its error.
pub fn reply<T: Serialize>(status: StatusCode, result: ServiceResult<T>) -> axum::response::Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Parse a path segment into a typed id.
pub fn parse_id<T: From<Uuid>>(what: &str, raw: &str) -> Result<T, axum::response::Response> {
    Uuid::parse_str(raw)
        .map(T::from)
        .map_err(|_| errors::invalid_id(what, raw))
}
