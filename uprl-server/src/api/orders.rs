//! Order read endpoints
//!
//! Latest-state views plus per-family history range reads.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use shared::fact::VersionFamily;
use shared::{ApiResponse, AppError};

use crate::core::ServerState;
use crate::projection::latest;

/// Build orders router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders/{order_id}", get(get_order))
        .route(
            "/api/orders/{order_id}/history/{family}",
            get(get_history),
        )
}

/// Latest-state view of one order
pub async fn get_order(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
) -> Result<Json<ApiResponse<latest::OrderView>>, AppError> {
    let view = latest::order_view(&state.store, &order_id)
        .map_err(|e| AppError::projection(e.to_string()))?;

    if view.pricing_latest.is_empty()
        && view.payment_latest.is_none()
        && view.supplier_latest.is_empty()
        && view.refund_latest.is_empty()
    {
        return Err(AppError::not_found(format!("order {}", order_id)));
    }

    Ok(Json(ApiResponse::success(view)))
}

/// Version range for history reads (inclusive, defaults to everything)
#[derive(Debug, Deserialize)]
pub struct HistoryRange {
    pub from_version: Option<u64>,
    pub to_version: Option<u64>,
}

/// Per-family history rows by version range
pub async fn get_history(
    State(state): State<ServerState>,
    Path((order_id, family)): Path<(String, String)>,
    Query(range): Query<HistoryRange>,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    let family = VersionFamily::parse(&family)
        .ok_or_else(|| AppError::invalid_request(format!("unknown version family '{family}'")))?;

    let rows = latest::history(
        &state.store,
        &order_id,
        family,
        range.from_version.unwrap_or(1),
        range.to_version.unwrap_or(u64::MAX),
    )
    .map_err(|e| AppError::projection(e.to_string()))?;

    Ok(Json(ApiResponse::success(rows)))
}
