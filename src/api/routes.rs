use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use super::analytics::{get_referrers, get_summary, get_trends};
use super::handlers::{
    create_link, delete_link, get_link, health_check, list_links, update_link, AppState,
};

pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/links", post(create_link))
        .route("/api/links", get(list_links))
        .route("/api/links/{code}", get(get_link))
        .route("/api/links/{code}", put(update_link))
        .route("/api/links/{code}", delete(delete_link))
        .route("/api/analytics/summary", get(get_summary))
        .route("/api/analytics/referrers", get(get_referrers))
        .route("/api/analytics/trends", get(get_trends))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
