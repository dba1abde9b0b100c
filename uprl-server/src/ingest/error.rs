//! Pipeline errors and their DLQ classification

use crate::identity::IdentityError;
use crate::store::StorageError;
use crate::versioning::VersionConflictError;
use shared::fact::DlqErrorKind;
use thiserror::Error;

/// Pipeline errors
///
/// None of these are fatal to the process: every variant maps to a DLQ
/// disposition via [`IngestError::dlq_kind`].
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    VersionConflict(#[from] VersionConflictError),

    #[error("version {version} already persisted for scope '{scope}'")]
    VersionAlreadyPresent { scope: String, version: u64 },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("event exceeded its processing budget")]
    EventTimeout,
}

impl IngestError {
    /// DLQ classification for this error
    pub fn dlq_kind(&self) -> DlqErrorKind {
        match self {
            Self::Validation(_) | Self::VersionAlreadyPresent { .. } => {
                DlqErrorKind::ValidationError
            }
            Self::Identity(_) => DlqErrorKind::IdentityError,
            Self::VersionConflict(_) => DlqErrorKind::VersionConflictError,
            Self::Storage(_) | Self::EventTimeout => DlqErrorKind::StorageError,
        }
    }

    /// Whether a retry with backoff may help before dead-lettering
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
