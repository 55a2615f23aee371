//! HTTP handlers, one module per resource.

pub mod auth;
pub mod capsules;
pub mod news;
pub mod users;

use axum::response::IntoResponse;
use axum::Json;

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
