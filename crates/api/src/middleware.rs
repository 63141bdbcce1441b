use axum::{http::HeaderMap, middleware::Next, response::Response};

use crate::context::{ACTOR_HEADER, Actor};

/// Attach the request's [`Actor`] and log the outcome.
pub async fn actor_middleware(mut req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let actor = extract_actor(req.headers());
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(actor);

    let response = next.run(req).await;
    let status = response.status();
    if status.is_server_error() {
        tracing::error!(%method, %path, status = status.as_u16(), "request failed");
    } else {
        tracing::debug!(%method, %path, status = status.as_u16(), "request handled");
    }
    response
}

fn extract_actor(headers: &HeaderMap) -> Actor {
    let name = headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Actor::new(name)
}
