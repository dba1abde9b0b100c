//! Event ingestion endpoint
//!
//! The transport adapter pushes one event per request. The pipeline never
//! fails the push: validation and storage failures land in the DLQ and are
//! reported in the outcome, so the response is 202 whichever way the event
//! went.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use shared::ApiResponse;

use crate::core::ServerState;
use crate::ingest::IngestOutcome;

/// Build events router
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/events", post(ingest_event))
}

/// Ingest one inbound event
pub async fn ingest_event(
    State(state): State<ServerState>,
    Json(raw): Json<Value>,
) -> (StatusCode, Json<ApiResponse<IngestOutcome>>) {
    let outcome = state.ingestor.ingest(raw).await;
    (StatusCode::ACCEPTED, Json(ApiResponse::success(outcome)))
}
