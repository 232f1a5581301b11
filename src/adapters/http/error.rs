//! Mapping of relay errors onto HTTP responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::RelayError;

/// JSON error body: `{"error": "...", "code": "..."}`.
///
/// `error` carries the message producers already match on (`No body`,
/// `Missing body parameters`, `Invalid secret`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    /// Body for `err`. Backend details are never exposed to callers.
    pub fn new(err: &RelayError) -> Self {
        let error = match err {
            RelayError::Storage(_) => "Service unavailable".to_string(),
            RelayError::Transport(_) => "Internal error".to_string(),
            other => other.to_string(),
        };
        Self {
            error,
            code: err.code().to_string(),
        }
    }
}

/// Request-boundary wrapper turning a [`RelayError`] into a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError(pub RelayError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RelayError::InvalidBody
            | RelayError::MissingParameters
            | RelayError::InvalidSecret
            | RelayError::UpstreamAuth(_) => StatusCode::BAD_REQUEST,
            RelayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            RelayError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.0 {
            RelayError::Storage(detail) | RelayError::Transport(detail) => {
                tracing::error!(code = %self.0.code(), %detail, "Request failed");
            }
            RelayError::UpstreamAuth(detail) => {
                tracing::warn!(%detail, "Authorization failed upstream");
            }
            _ => {}
        }

        let mut response = (status, Json(ErrorResponse::new(&self.0))).into_response();
        if let RelayError::RateLimited { retry_after_secs } = self.0 {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
