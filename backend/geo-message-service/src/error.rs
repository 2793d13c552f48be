/// Error types for Geo Message Service
///
/// Domain errors (`ValidationError`) are raised before any store interaction.
/// `AppError` is the HTTP-facing error and maps each failure to a status code.
use crate::db::StoreError;
use crate::services::FinderError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for geo-message-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Rejected caller input. Never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid latitude_bottom")]
    InvalidLatitudeBottom,

    #[error("Invalid latitude_top")]
    InvalidLatitudeTop,

    #[error("Invalid longitude_left")]
    InvalidLongitudeLeft,

    #[error("Invalid longitude_right")]
    InvalidLongitudeRight,

    #[error("latitude_bottom is greater than latitude_top")]
    InvertedLatitude,

    #[error("longitude_left is greater than longitude_right (boxes crossing the antimeridian are not supported)")]
    AntimeridianCrossing,

    #[error("max_records must be a positive integer")]
    NonPositiveMaxRecords,

    #[error("max_records must not exceed {ceiling}")]
    MaxRecordsTooLarge { ceiling: usize },

    #[error("invalid message payload: {0}")]
    Payload(String),
}

impl ValidationError {
    /// Body text sent by the in-band (legacy) reporting mode. Existing
    /// clients match on these strings, typos included.
    pub fn legacy_message(&self) -> String {
        match self {
            ValidationError::InvertedLatitude => {
                "Passed bottom_latitude that is greater than top_latitude".to_string()
            }
            ValidationError::AntimeridianCrossing => {
                "Passed left_longitude that is greater than right_latitude".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Store timed out after {0} ms")]
    Timeout(u128),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}

impl From<FinderError> for AppError {
    fn from(err: FinderError) -> Self {
        match err {
            FinderError::Validation(e) => AppError::Validation(e),
            FinderError::StoreUnavailable(e) => AppError::ServiceUnavailable(e.to_string()),
            FinderError::Timeout(elapsed) => AppError::Timeout(elapsed.as_millis()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::ServiceUnavailable(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(ValidationError::Payload(err.to_string()))
    }
}
