//! HTTP-facing error mapping.
//!
//! Internal strategy errors never reach the wire; by the time a
//! [`crate::core::SynthesisError`] leaves the orchestrator it is either a
//! validation failure or a terminal synthesis failure. This module maps
//! those onto structured JSON responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::core::SynthesisError;

/// Application-level error returned by HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// The request was malformed (empty text). 422.
    Validation(String),
    /// Every synthesis strategy was exhausted. 502.
    Upstream(String),
    /// Anything that should not normally escape the pipeline. 500.
    Internal(String),
}

impl From<SynthesisError> for AppError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::Validation(message) => AppError::Validation(message),
            SynthesisError::SynthesisFailed(message) => AppError::Upstream(message),
            // Cancellations surface when the client has already gone away;
            // classify as upstream so nothing alarming is logged as a bug.
            SynthesisError::Cancelled => AppError::Upstream("request cancelled".to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_request", message)
            }
            AppError::Upstream(message) => {
                (StatusCode::BAD_GATEWAY, "synthesis_failed", message)
            }
            AppError::Internal(message) => {
                tracing::error!(%message, "unexpected internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": message,
        }));
        (status, body).into_response()
    }
}

/// Result alias for HTTP handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_422() {
        let response = AppError::from(SynthesisError::Validation("empty".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_synthesis_failed_maps_to_502() {
        let response =
            AppError::from(SynthesisError::SynthesisFailed("all endpoints down".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let err = AppError::from(SynthesisError::Auth("private detail".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
