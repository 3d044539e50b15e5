use crate::services::{issuer::IssueError, listing::ListingError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Map a listing failure. Upstream detail is logged, not returned.
    pub fn from_listing(err: ListingError, public_msg: &str) -> Self {
        match err {
            ListingError::UpstreamUnavailable(source) => {
                tracing::error!(error = %source, "{}", public_msg);
                Self::internal(public_msg)
            }
        }
    }

    /// Map an issuing failure. Upstream detail is logged, not returned.
    pub fn from_issue(err: IssueError, public_msg: &str) -> Self {
        match err {
            IssueError::MissingKey => Self::bad_request("Key is required"),
            IssueError::UpstreamUnavailable(source) => {
                tracing::error!(error = %source, "{}", public_msg);
                Self::internal(public_msg)
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn anyhow_error_renders_as_500_json() {
        let err: AppError = anyhow::anyhow!("bucket config missing").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "bucket config missing", "status": 500 }));
    }

    #[test]
    fn missing_key_maps_to_400() {
        let err = AppError::from_issue(IssueError::MissingKey, "unused");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Key is required");
    }
}
