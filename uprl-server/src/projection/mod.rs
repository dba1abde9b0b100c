//! Read-side projections
//!
//! Pure functions over the fact store; identical input yields identical
//! output (deterministic grouping and ordering throughout) and nothing
//! here ever writes.
//!
//! - [`latest`] - per-family "latest row" views and history range reads
//! - [`payables`] - effective supplier payables per instance

pub mod latest;
pub mod payables;

pub use latest::{order_view, OrderView};
pub use payables::{effective_payables, PayableInstance, ProjectedObligation};

use crate::store::StorageError;
use thiserror::Error;

/// Projection errors
///
/// Row-level inconsistencies never land here: they surface as per-instance
/// warnings so one bad instance cannot fail a whole order read.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;
