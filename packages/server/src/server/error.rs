//! Error responses.
//!
//! Every failure leaves the API as `{"detail": "..."}` with a status code
//! chosen by the domain error that caused it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domains::analysis::{LookupError, PipelineError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        let status = match error {
            PipelineError::ExtractionFailed => StatusCode::BAD_REQUEST,
            PipelineError::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.to_string())
    }
}

impl From<LookupError> for ApiError {
    fn from(error: LookupError) -> Self {
        let status = match error {
            LookupError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            LookupError::NotFound => StatusCode::NOT_FOUND,
            LookupError::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_errors_map_to_status() {
        let error = ApiError::from(PipelineError::ExtractionFailed);
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.detail, "Failed to scrape content from URL");

        let error = ApiError::from(PipelineError::Unclassified("boom".into()));
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.detail, "boom");
    }

    #[test]
    fn test_lookup_errors_map_to_status() {
        assert_eq!(
            ApiError::from(LookupError::StoreUnavailable),
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Database not configured")
        );
        assert_eq!(
            ApiError::from(LookupError::NotFound),
            ApiError::new(StatusCode::NOT_FOUND, "Analysis not found")
        );
        assert_eq!(
            ApiError::from(LookupError::Unclassified("disk full".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
