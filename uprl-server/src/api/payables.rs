//! Effective payables endpoint

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use shared::{ApiResponse, AppError};

use crate::core::ServerState;
use crate::projection::payables::{self, PayableInstance};

/// Build payables router
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/orders/{order_id}/payables", get(get_payables))
}

/// Effective payables for every instance of an order
///
/// Per-instance projection problems surface in each instance's
/// `warnings`; only a storage-level failure turns into an error response.
pub async fn get_payables(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<PayableInstance>>>, AppError> {
    let instances = payables::effective_payables(&state.store, &order_id)
        .map_err(|e| AppError::projection(e.to_string()))?;
    Ok(Json(ApiResponse::success(instances)))
}
