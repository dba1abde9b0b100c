//! Shared types for the Unified Pricing Read Layer
//!
//! Common types crossed between the ingestion (write) side and the
//! projection (read) side:
//!
//! - **Event envelope** (`event`): the inbound wire format producers push,
//!   one payload module per event kind, legacy-shape lifting
//! - **Fact rows** (`fact`): the normalized append-only rows the Core
//!   persists, plus the version-family and amount-effect vocabulary
//! - **Errors** (`error`): unified error codes, [`AppError`] and the
//!   [`ApiResponse`] envelope used by every HTTP endpoint
//! - **Utilities** (`util`): clock and timestamp helpers

pub mod error;
pub mod event;
pub mod fact;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Unified error system re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Envelope re-exports (for convenient access)
pub use event::{EventEnvelope, EventType, SchemaVersion};

// Fact vocabulary re-exports
pub use fact::{AmountEffect, VersionFamily, BOOKING_LEVEL};
