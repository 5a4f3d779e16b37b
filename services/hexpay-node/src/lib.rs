//! HexPay HTTP service: merchant registration and customer location checks.

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/api/v1/merchants",
            post(handlers::create_merchant).get(handlers::list_merchants),
        )
        .route(
            "/api/v1/merchants/:merchant_id",
            get(handlers::get_merchant)
                .put(handlers::update_merchant)
                .delete(handlers::delete_merchant),
        )
        .route(
            "/api/v1/merchants/:merchant_id/h3-data",
            get(handlers::merchant_h3_data),
        )
        .route("/api/v1/h3-data/latest", get(handlers::latest_h3_data))
        .route("/api/v1/validate/location", post(handlers::validate_location))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if state.config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = state
        .config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}
