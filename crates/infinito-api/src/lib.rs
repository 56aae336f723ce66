pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::CorsConfig;
use crate::routes::{generations, health};
use crate::state::AppState;

/// Routes without transport layers; used directly by tests
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/generations", post(generations::create_generation))
        .route("/generations/bulk-delete", post(generations::bulk_delete))
        .route(
            "/generations/:id",
            patch(generations::commit_edit).delete(generations::delete_generation),
        )
        .route("/generations/:id/thread", get(generations::get_thread))
        .route(
            "/generations/:id/expansions",
            post(generations::create_expansion),
        )
        .with_state(state)
}

pub fn build_router(state: Arc<AppState>, cors: &CorsConfig, timeout: Duration) -> Router {
    api_routes(state)
        .layer(axum_middleware::from_fn(middleware::logging::log_request))
        .layer(TimeoutLayer::new(timeout))
        .layer(build_cors_layer(cors))
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::permissive();
    }

    let mut cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any);

    if config.origins.iter().any(|o| o == "*") {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<axum::http::HeaderValue> = config
            .origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors = cors.allow_origin(AllowOrigin::list(origins));
    }

    cors
}
