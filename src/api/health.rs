use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub providers: Vec<String>,
    pub database: String,
}

pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let version = env!("CARGO_PKG_VERSION").to_string();

    let database_up = state.stores.is_healthy().await;

    let response = HealthResponse {
        status: if database_up { "healthy" } else { "degraded" }.to_string(),
        version,
        environment: state.config.server.environment.clone(),
        providers: state
            .config
            .configured_providers()
            .into_iter()
            .map(String::from)
            .collect(),
        database: if database_up { "connected" } else { "unavailable" }.to_string(),
    };

    Ok(Json(response))
}
