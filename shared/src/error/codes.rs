//! Unified error codes for the UPRL Core
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Validation errors (shape, enums, timestamps)
//! - 2xxx: Identity errors (semantic / instance ID construction)
//! - 3xxx: Versioning errors
//! - 4xxx: Storage errors
//! - 5xxx: Projection errors
//! - 6xxx: Dead letter queue errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Validation ====================
    /// Shape validation failed
    ValidationFailed = 1001,
    /// Required field missing
    RequiredField = 1002,
    /// Enum value not in the allowed set
    InvalidEnum = 1003,
    /// Malformed ISO-8601 timestamp
    InvalidTimestamp = 1004,
    /// schema_version token not recognized
    UnknownSchemaVersion = 1005,
    /// event_type not recognized
    UnknownEventType = 1006,
    /// event_type and schema_version do not belong together
    SchemaMismatch = 1007,

    // ==================== 2xxx: Identity ====================
    /// Component is missing component_type
    MissingComponentType = 2001,
    /// A dimension value is not a scalar
    NonScalarDimension = 2002,

    // ==================== 3xxx: Versioning ====================
    /// Lost the per-scope lock race after retries
    VersionConflict = 3001,
    /// Producer-assigned version already persisted for the scope
    VersionAlreadyPresent = 3002,

    // ==================== 4xxx: Storage ====================
    /// Underlying store failed
    StorageError = 4001,
    /// Storage operation exceeded its time budget
    StorageTimeout = 4002,

    // ==================== 5xxx: Projection ====================
    /// Inconsistent rows encountered while projecting
    ProjectionError = 5001,

    // ==================== 6xxx: Dead letter ====================
    /// event_id already ingested (idempotent skip)
    DuplicateEvent = 6001,
    /// DLQ entry not found
    DlqEntryNotFound = 6002,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Operation timed out
    TimeoutError = 9002,
}

impl ErrorCode {
    /// Numeric value of this code
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "OK",
            Self::Unknown => "Unknown error",
            Self::NotFound => "Resource not found",
            Self::InvalidRequest => "Invalid request",
            Self::ValidationFailed => "Validation failed",
            Self::RequiredField => "Required field missing",
            Self::InvalidEnum => "Value not in the allowed set",
            Self::InvalidTimestamp => "Malformed timestamp",
            Self::UnknownSchemaVersion => "Unknown schema_version token",
            Self::UnknownEventType => "Unknown event_type",
            Self::SchemaMismatch => "event_type does not match schema_version",
            Self::MissingComponentType => "component_type is missing",
            Self::NonScalarDimension => "Dimension value is not a scalar",
            Self::VersionConflict => "Version scope lock conflict",
            Self::VersionAlreadyPresent => "Version already persisted for scope",
            Self::StorageError => "Storage error",
            Self::StorageTimeout => "Storage operation timed out",
            Self::ProjectionError => "Projection error",
            Self::DuplicateEvent => "Event already ingested",
            Self::DlqEntryNotFound => "DLQ entry not found",
            Self::InternalError => "Internal error",
            Self::TimeoutError => "Operation timed out",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), *self as u16)
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code as u16
    }
}

/// Error returned when a u16 does not map to a known [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            3 => Self::NotFound,
            5 => Self::InvalidRequest,
            1001 => Self::ValidationFailed,
            1002 => Self::RequiredField,
            1003 => Self::InvalidEnum,
            1004 => Self::InvalidTimestamp,
            1005 => Self::UnknownSchemaVersion,
            1006 => Self::UnknownEventType,
            1007 => Self::SchemaMismatch,
            2001 => Self::MissingComponentType,
            2002 => Self::NonScalarDimension,
            3001 => Self::VersionConflict,
            3002 => Self::VersionAlreadyPresent,
            4001 => Self::StorageError,
            4002 => Self::StorageTimeout,
            5001 => Self::ProjectionError,
            6001 => Self::DuplicateEvent,
            6002 => Self::DlqEntryNotFound,
            9001 => Self::InternalError,
            9002 => Self::TimeoutError,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
