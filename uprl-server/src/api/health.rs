//! Health check endpoint

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use shared::{ApiResponse, AppError};

use crate::core::ServerState;
use crate::store::StoreStats;

/// Build health router
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub environment: String,
    pub uptime_seconds: i64,
    pub store: StoreStats,
}

/// Health and storage statistics
pub async fn health(
    State(state): State<ServerState>,
) -> Result<Json<ApiResponse<HealthResponse>>, AppError> {
    let store = state
        .store
        .stats()
        .map_err(|e| AppError::storage(e.to_string()))?;

    Ok(Json(ApiResponse::success(HealthResponse {
        status: "ok",
        environment: state.config.environment.clone(),
        uptime_seconds: state.uptime_seconds(),
        store,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;

    #[tokio::test]
    async fn test_health_reports_store_stats() {
        let state = ServerState::in_memory(Config::with_overrides("/tmp/uprl-test", 0));
        let response = health(State(state)).await.unwrap();
        let body = response.0.data.unwrap();
        assert_eq!(body.status, "ok");
        assert_eq!(body.store.pricing_components, 0);
        assert_eq!(body.store.dlq_entries, 0);
    }
}
