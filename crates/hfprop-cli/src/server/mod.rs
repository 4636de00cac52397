//! HTTP surface for predictions.

mod error;
mod handlers;
mod state;

pub use state::AppState;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/predict", get(handlers::predict))
        .route("/predict/hourly", get(handlers::predict_hourly))
        .route("/bands", get(handlers::bands))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
