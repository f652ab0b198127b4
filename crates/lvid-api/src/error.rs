//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use lvid_pipeline::PipelineError;
use lvid_store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(e) => match e {
                PipelineError::Busy => StatusCode::CONFLICT,
                PipelineError::InvalidTransition { .. } => StatusCode::CONFLICT,
                PipelineError::MissingPrerequisite { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
                PipelineError::Timeout { .. }
                | PipelineError::JobNotFound { .. }
                | PipelineError::JobFailed { .. }
                | PipelineError::Provider(_) => StatusCode::BAD_GATEWAY,
                PipelineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Machine-readable code for the conditions the UI branches on.
    fn code(&self) -> Option<&'static str> {
        match self {
            ApiError::Pipeline(PipelineError::Busy) => Some("busy"),
            ApiError::Pipeline(PipelineError::InvalidTransition { .. }) => {
                Some("invalid_transition")
            }
            ApiError::Pipeline(PipelineError::MissingPrerequisite { .. }) => {
                Some("missing_prerequisite")
            }
            ApiError::Pipeline(PipelineError::Timeout { .. }) => Some("timeout"),
            _ => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ApiError::NotFound(format!("Project not found: {id}")),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let detail = match &self {
            ApiError::Pipeline(e) => e.user_message(),
            other => other.to_string(),
        };

        let body = ErrorResponse { detail, code };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_maps_to_conflict_with_code() {
        let err = ApiError::Pipeline(PipelineError::Busy);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), Some("busy"));
    }

    #[test]
    fn test_provider_failures_are_bad_gateway() {
        let err = ApiError::Pipeline(PipelineError::JobFailed {
            message: "x".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
