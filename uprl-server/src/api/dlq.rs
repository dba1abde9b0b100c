//! Dead letter queue endpoints
//!
//! Listing for inspection, replay for remediation. DLQ entries stay in
//! place after replay (audit trail); only their retry counter moves.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use shared::fact::{DlqEntry, DlqErrorKind};
use shared::{ApiResponse, AppError, ErrorCode};

use crate::core::ServerState;
use crate::ingest::IngestOutcome;
use crate::store::{DlqFilter, StorageError};

/// Build DLQ router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/dlq", get(list_dlq))
        .route("/api/dlq/{dlq_id}/replay", post(replay_dlq))
}

/// Query parameters for DLQ listing
#[derive(Debug, Deserialize)]
pub struct DlqQuery {
    pub error_kind: Option<String>,
    pub order_id: Option<String>,
    pub limit: Option<usize>,
}

/// List DLQ entries matching a filter
pub async fn list_dlq(
    State(state): State<ServerState>,
    Query(query): Query<DlqQuery>,
) -> Result<Json<ApiResponse<Vec<DlqEntry>>>, AppError> {
    let error_kind = match query.error_kind.as_deref() {
        Some(raw) => Some(DlqErrorKind::parse(raw).ok_or_else(|| {
            AppError::invalid_request(format!("unknown error_kind '{raw}'"))
        })?),
        None => None,
    };

    let entries = state
        .store
        .list_dlq(&DlqFilter {
            error_kind,
            order_id: query.order_id,
            limit: query.limit,
        })
        .map_err(|e| AppError::storage(e.to_string()))?;

    Ok(Json(ApiResponse::success(entries)))
}

/// Replay one dead-lettered event through the pipeline
pub async fn replay_dlq(
    State(state): State<ServerState>,
    Path(dlq_id): Path<String>,
) -> Result<Json<ApiResponse<IngestOutcome>>, AppError> {
    let outcome = state.ingestor.replay_dlq(&dlq_id).await.map_err(|e| match e {
        StorageError::DlqEntryNotFound(id) => {
            AppError::with_message(ErrorCode::DlqEntryNotFound, format!("DLQ entry {id} not found"))
        }
        other => AppError::storage(other.to_string()),
    })?;

    tracing::info!(dlq_id = %dlq_id, "DLQ entry replayed");
    Ok(Json(ApiResponse::success(outcome)))
}
