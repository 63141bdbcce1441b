use axum::Router;

pub mod common;
pub mod inventory;
pub mod kitchen;
pub mod orders;
pub mod purchases;
pub mod settings;
pub mod suppliers;
pub mod system;
pub mod waste;

pub fn router() -> Router {
    Router::new()
        .nest("/inventory", inventory::router())
        .nest("/suppliers", suppliers::router())
        .nest("/purchases", purchases::router())
        .nest("/waste", waste::router())
        .nest("/orders", orders::router())
        .nest("/kitchen", kitchen::router())
        .nest("/settings", settings::router())
}
