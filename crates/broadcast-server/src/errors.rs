//! HTTP error mapping.
//!
//! Every error body has the shape `{"status": "error", "message": ...}`.
//! Messages are fixed per variant so internal details never reach clients;
//! details are logged where the error is created.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use broadcast_dispatch::DispatchError;
use serde::Serialize;
use tracing::error;

/// Message for rejected campaign input.
pub const INVALID_INPUT_MESSAGE: &str = "Invalid message or numbers";
/// Message when a campaign is already running.
pub const BUSY_MESSAGE: &str = "A campaign is already being sent.";
/// Message when cancel finds nothing to cancel.
pub const NOTHING_TO_CANCEL_MESSAGE: &str = "No messages are being sent.";
/// Message for systemic dispatch failures.
pub const DISPATCH_FAILED_MESSAGE: &str = "Error sending messages";

/// Error body on the wire.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `"error"`.
    pub status: &'static str,
    /// Client-facing message.
    pub message: String,
}

/// Errors returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed message/numbers.
    #[error("Invalid message or numbers")]
    InvalidInput,

    /// A campaign is already running.
    #[error("A campaign is already being sent.")]
    Busy,

    /// Cancel requested with no campaign running.
    #[error("No messages are being sent.")]
    NothingToCancel,

    /// Requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Anything else; the message is client-safe.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::NothingToCancel => StatusCode::BAD_REQUEST,
            Self::Busy => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::InvalidInput(_) => Self::InvalidInput,
            DispatchError::Busy => Self::Busy,
            DispatchError::Systemic(reason) => {
                error!(%reason, "campaign dispatch failed");
                Self::Internal(DISPATCH_FAILED_MESSAGE.into())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::InvalidInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NothingToCancel.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Busy.status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn dispatch_errors_map() {
        assert!(matches!(
            ApiError::from(DispatchError::InvalidInput("empty".into())),
            ApiError::InvalidInput
        ));
        assert!(matches!(ApiError::from(DispatchError::Busy), ApiError::Busy));
    }

    #[test]
    fn fixed_messages() {
        assert_eq!(ApiError::InvalidInput.to_string(), INVALID_INPUT_MESSAGE);
        assert_eq!(ApiError::Busy.to_string(), BUSY_MESSAGE);
        assert_eq!(ApiError::NothingToCancel.to_string(), NOTHING_TO_CANCEL_MESSAGE);
    }

    #[test]
    fn systemic_error_hides_reason() {
        let err = ApiError::from(DispatchError::Systemic("task panicked at foo.rs:12".into()));
        assert_eq!(err.to_string(), DISPATCH_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn response_body_shape() {
        let resp = ApiError::NothingToCancel.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["message"], NOTHING_TO_CANCEL_MESSAGE);
    }
}
