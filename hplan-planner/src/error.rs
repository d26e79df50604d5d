//! Error types for hplan-planner HTTP handlers

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// hplan-common error; status depends on the kind
    #[error(transparent)]
    Common(#[from] hplan_common::Error),
}

impl ApiError {
    pub fn session_not_found(session_id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("Session {}", session_id))
    }
}

/// Malformed JSON bodies use the same error contract as rejected values
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Common(hplan_common::Error::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use hplan_common::Error as CommonError;

        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Common(err) => match err {
                CommonError::InvalidInput(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_INPUT", err.to_string())
                }
                CommonError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION", err.to_string())
                }
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMMON_ERROR",
                    err.to_string(),
                ),
            },
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
