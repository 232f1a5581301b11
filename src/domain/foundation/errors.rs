//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Machine-readable error codes, one per failure class callers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Body could not be parsed at all.
    InvalidBody,
    /// Required fields absent or empty.
    MissingParameters,
    /// Secret does not resolve to an identity.
    InvalidSecret,
    /// Caller exceeded its request budget.
    RateLimited,
    /// External OAuth exchange failed.
    UpstreamAuth,
    /// A live connection broke.
    Transport,
    /// Credential storage unavailable.
    StorageError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidBody => "INVALID_BODY",
            ErrorCode::MissingParameters => "MISSING_PARAMETERS",
            ErrorCode::InvalidSecret => "INVALID_SECRET",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::UpstreamAuth => "UPSTREAM_AUTH",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::StorageError => "STORAGE_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Request-scoped failures of the relay.
///
/// Every variant is handled at the request boundary (ingress handler,
/// handshake, authorization callback) and turned into a response; none is
/// fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Body missing or not parseable.
    #[error("No body")]
    InvalidBody,

    /// Required body parameters absent.
    #[error("Missing body parameters")]
    MissingParameters,

    /// Presented secret does not resolve; the user must re-authorize.
    #[error("Invalid secret")]
    InvalidSecret,

    /// Caller must back off and retry later.
    #[error("Rate limit exceeded")]
    RateLimited { retry_after_secs: u32 },

    /// External OAuth token exchange failed.
    #[error("Authentication error")]
    UpstreamAuth(String),

    /// A connection broke mid-session.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Credential store backend failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl RelayError {
    /// Returns the machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            RelayError::InvalidBody => ErrorCode::InvalidBody,
            RelayError::MissingParameters => ErrorCode::MissingParameters,
            RelayError::InvalidSecret => ErrorCode::InvalidSecret,
            RelayError::RateLimited { .. } => ErrorCode::RateLimited,
            RelayError::UpstreamAuth(_) => ErrorCode::UpstreamAuth,
            RelayError::Transport(_) => ErrorCode::Transport,
            RelayError::Storage(_) => ErrorCode::StorageError,
        }
    }

    /// Returns true for failures the caller must fix in its own request.
    pub fn is_validation(&self) -> bool {
        matches!(self, RelayError::InvalidBody | RelayError::MissingParameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("identity");
        assert_eq!(format!("{}", err), "Field 'identity' cannot be empty");
    }

    #[test]
    fn relay_error_messages_match_wire_format() {
        assert_eq!(RelayError::InvalidBody.to_string(), "No body");
        assert_eq!(
            RelayError::MissingParameters.to_string(),
            "Missing body parameters"
        );
        assert_eq!(RelayError::InvalidSecret.to_string(), "Invalid secret");
        assert_eq!(
            RelayError::UpstreamAuth("token endpoint returned 401".into()).to_string(),
            "Authentication error"
        );
    }

    #[test]
    fn relay_error_codes() {
        assert_eq!(RelayError::InvalidSecret.code(), ErrorCode::InvalidSecret);
        assert_eq!(
            RelayError::RateLimited { retry_after_secs: 1 }.code(),
            ErrorCode::RateLimited
        );
        assert_eq!(ErrorCode::MissingParameters.to_string(), "MISSING_PARAMETERS");
    }

    #[test]
    fn only_body_problems_are_validation_errors() {
        assert!(RelayError::InvalidBody.is_validation());
        assert!(RelayError::MissingParameters.is_validation());
        assert!(!RelayError::InvalidSecret.is_validation());
    }
}
