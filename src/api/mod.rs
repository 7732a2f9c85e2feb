use std::sync::Arc;

use axum::{ routing::get, Router };
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod tracking;

use crate::services::TrackingService;

#[derive(Clone)]
pub struct AppState {
    pub tracking_service: Arc<TrackingService>,
}

impl AppState {
    pub fn new(tracking_service: Arc<TrackingService>) -> Self {
        Self { tracking_service }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/alive", get(alive))
        .route("/api/users/{chat_id}", get(tracking::get_user))
        .route(
            "/api/tracking",
            axum::routing
                ::post(tracking::start_tracking)
                .put(tracking::update_tracking)
                .delete(tracking::stop_tracking)
        )
        .route("/api/products/{id}/history", get(tracking::product_history))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn alive() -> &'static str {
    "OK"
}
