use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span, request_id_middleware},
    services::{lists::ListService, suggestions::SuggestionEngine},
};

pub mod lists;
pub mod suggestions;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub lists: ListService,
    pub suggestions: Arc<SuggestionEngine>,
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state))
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/lists", post(lists::create))
        .route("/lists/:id", get(lists::fetch))
        .route("/lists/:id/items", get(lists::items).delete(lists::remove_item))
        .route("/lists/:id/items/:item_id", get(lists::item))
        .route(
            "/lists/:id/items/:item_id/description",
            post(lists::set_description),
        )
        .route("/lists/:id/add-item-by-name", post(lists::add_by_name))
        .route("/lists/:id/recent-items", get(lists::recent))
        .route("/lists/:id/recipe-items", post(lists::add_recipe_items))
        .route("/lists/:id/suggested-items", get(suggestions::suggested))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
