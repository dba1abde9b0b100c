//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Validation errors
/// - 2xxx: Identity errors
/// - 3xxx: Versioning errors
/// - 4xxx: Storage errors
/// - 5xxx: Projection errors
/// - 6xxx: Dead letter errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Validation errors (1xxx)
    Validation,
    /// Identity errors (2xxx)
    Identity,
    /// Versioning errors (3xxx)
    Versioning,
    /// Storage errors (4xxx)
    Storage,
    /// Projection errors (5xxx)
    Projection,
    /// Dead letter errors (6xxx)
    DeadLetter,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Validation,
            2000..3000 => Self::Identity,
            3000..4000 => Self::Versioning,
            4000..5000 => Self::Storage,
            5000..6000 => Self::Projection,
            6000..7000 => Self::DeadLetter,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Validation => "validation",
            Self::Identity => "identity",
            Self::Versioning => "versioning",
            Self::Storage => "storage",
            Self::Projection => "projection",
            Self::DeadLetter => "dead_letter",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Validation);
        assert_eq!(ErrorCategory::from_code(2002), ErrorCategory::Identity);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::Versioning);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Storage);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::Projection);
        assert_eq!(ErrorCategory::from_code(6001), ErrorCategory::DeadLetter);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10000), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::Success.category(), ErrorCategory::General);
        assert_eq!(
            ErrorCode::ValidationFailed.category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            ErrorCode::NonScalarDimension.category(),
            ErrorCategory::Identity
        );
        assert_eq!(
            ErrorCode::VersionConflict.category(),
            ErrorCategory::Versioning
        );
        assert_eq!(ErrorCode::StorageError.category(), ErrorCategory::Storage);
        assert_eq!(
            ErrorCode::ProjectionError.category(),
            ErrorCategory::Projection
        );
        assert_eq!(
            ErrorCode::DuplicateEvent.category(),
            ErrorCategory::DeadLetter
        );
        assert_eq!(ErrorCode::InternalError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::Validation).unwrap();
        assert_eq!(json, "\"validation\"");

        let json = serde_json::to_string(&ErrorCategory::DeadLetter).unwrap();
        assert_eq!(json, "\"dead_letter\"");
    }
}
