use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use galley_core::DomainError;
use galley_infra::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    let code = err.code();
    let status = match &err {
        ServiceError::Domain(e) => match e {
            DomainError::Validation(_) | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::InsufficientStock { .. } | DomainError::InvariantViolation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        },
        ServiceError::Concurrency(_) => StatusCode::CONFLICT,
        ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "service failure");
    }
    json_error(status, code, err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn invalid_id(what: &str, raw: &str) -> axum::response::Response {
    json_error(
        StatusCode::BAD_REQUEST,
        "invalid_id",
        format!("invalid {what} id '{raw}'"),
    )
}
