//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::intelligence::AnalysisError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Guideline not resolved: {0}")]
    GuidelineUnresolved(String),
    #[error("Analysis deadline exceeded ({0} ms)")]
    DeadlineExceeded(u128),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                detail.clone(),
            ),
            ApiError::GuidelineUnresolved(detail) => (
                StatusCode::NOT_FOUND,
                "GUIDELINE_UNRESOLVED",
                detail.clone(),
            ),
            ApiError::DeadlineExceeded(ms) => (
                StatusCode::GATEWAY_TIMEOUT,
                "DEADLINE_EXCEEDED",
                format!("Analysis did not complete within {ms} ms"),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::InvalidInput(detail) => ApiError::BadRequest(detail),
            AnalysisError::GuidelineResolution(detail) => ApiError::GuidelineUnresolved(detail),
            AnalysisError::DeadlineExceeded(ms) => ApiError::DeadlineExceeded(ms),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
