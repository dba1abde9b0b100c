//! Utilities - logging setup and unified error re-exports

pub mod logger;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Convenience functions for creating JSON responses
pub mod response {
    use super::ApiResponse;
    use axum::Json;

    pub fn ok<T: serde::Serialize>(data: T) -> Json<ApiResponse<T>> {
        Json(ApiResponse::success(data))
    }
}

pub use response::ok;
