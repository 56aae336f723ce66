use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: StoreHealth,
    pub generator_model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreHealth {
    pub backend: String,
    pub reachable: bool,
}

/// Liveness plus a cheap store check
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let reachable = match state.store.get("_health_check").await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(backend = state.store_backend, error = %e, "Store check failed");
            false
        }
    };

    Ok(Json(HealthResponse {
        status: if reachable { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: StoreHealth {
            backend: state.store_backend.to_string(),
            reachable,
        },
        generator_model: state.generator_config.model.clone(),
    }))
}
