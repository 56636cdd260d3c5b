use authgate_core::GateError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failures that end a request without re-rendering a form.
///
/// Form-level problems (taken username, bad credentials, ...) are turned
/// into inline errors by the handlers and never reach this type.
#[derive(Debug)]
pub enum AppError {
    InvalidToken,
    Internal(String),
}

pub const INVALID_TOKEN_MESSAGE: &str =
    "Error: invalid CSRF token. Please reload the page and try again.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidToken => (StatusCode::FORBIDDEN, INVALID_TOKEN_MESSAGE).into_response(),
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<GateError> for AppError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::InvalidToken => AppError::InvalidToken,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {e}"))
    }
}
