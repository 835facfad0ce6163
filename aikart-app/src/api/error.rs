//! Error-to-response mapping for the deck API.
//!
//! Every failure leaves a handler as an [`ApiError`] and is rendered as
//! `{"error": {"code": ..., "message": ...}}` with the matching status.

use aikart_core::CoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable code, e.g. "NOT_FOUND"
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unreadable payload (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Domain rule rejected the request (400)
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn deck_not_found(id: aikart_core::DeckId) -> Self {
        Self::NotFound(format!("Deck {id} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::warn!("{self}");
        }

        let code = self.code().to_string();
        let message = match self {
            ApiError::BadRequest(m)
            | ApiError::Validation(m)
            | ApiError::NotFound(m)
            | ApiError::Internal(m) => m,
        };

        (
            status,
            Json(ApiErrorResponse {
                error: ApiErrorBody { code, message },
            }),
        )
            .into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(message) => ApiError::Validation(message),
            CoreError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            CoreError::Invalid(what) => ApiError::BadRequest(format!("invalid {what}")),
            // A uniqueness clash is the same rule the validator checks, caught later.
            CoreError::Conflict(what) => ApiError::Validation(what.to_string()),
            CoreError::Storage(what) => {
                // Don't expose store internals to clients
                tracing::error!("storage failure: {what}");
                ApiError::Internal("Storage operation failed".to_string())
            }
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
