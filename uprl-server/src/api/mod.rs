//! API routes
//!
//! # Structure
//!
//! - [`events`] - inbound event push (the bus adapter POSTs here)
//! - [`orders`] - latest-state order views and per-family history
//! - [`payables`] - effective supplier payables
//! - [`dlq`] - dead letter queue listing and replay
//! - [`health`] - health check and storage stats

pub mod dlq;
pub mod events;
pub mod health;
pub mod orders;
pub mod payables;

use crate::core::ServerState;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Assemble the full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(events::router())
        .merge(orders::router())
        .merge(payables::router())
        .merge(dlq::router())
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
