//! HTTP surface: route table and request handlers

mod orders;
mod products;
mod profile;
mod purchases;

use crate::state::AppState;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

pub fn router(state: AppState) -> Router {
    let media_dir = state.config.media_dir.clone();
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "mayorista"})) }),
        )
        .route("/api/v1/products", get(products::list).post(products::create))
        .route("/api/v1/products/sku/:sku", get(products::by_sku))
        .route(
            "/api/v1/products/:id",
            get(products::get).put(products::update).delete(products::remove),
        )
        .route("/api/v1/orders", get(orders::list).post(orders::create))
        .route(
            "/api/v1/orders/:id",
            get(orders::get).patch(orders::set_status).delete(orders::remove),
        )
        .route("/api/v1/purchases", get(purchases::list).post(purchases::create))
        .route("/api/v1/me", get(profile::me))
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
