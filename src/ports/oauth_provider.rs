//! OAuth provider port - the external platform that vouches for an identity.
//!
//! The relay does not design an authentication protocol. It sends the user
//! to the platform's consent page, receives an authorization code on the
//! callback, exchanges it once for an access token, and asks the platform
//! whose token it is. The resulting identity is what secrets are bound to.

use async_trait::async_trait;

use crate::domain::foundation::{AccessToken, IdentityId, RelayError};

/// What the user wants from the authorization round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizeIntent {
    /// Link the identity, keeping an existing secret if there is one.
    Link,
    /// Force a new secret, invalidating the old one.
    Reset,
}

impl AuthorizeIntent {
    /// OAuth `state` value that marks a reset round trip.
    pub const RESET_STATE: &'static str = "reset";

    /// Recover the intent from the callback's `state` parameter.
    pub fn from_state(state: Option<&str>) -> Self {
        match state {
            Some(Self::RESET_STATE) => AuthorizeIntent::Reset,
            _ => AuthorizeIntent::Link,
        }
    }

    /// `state` parameter to attach to the consent URL, if any.
    pub fn state(&self) -> Option<&'static str> {
        match self {
            AuthorizeIntent::Link => None,
            AuthorizeIntent::Reset => Some(Self::RESET_STATE),
        }
    }
}

/// Errors from the external OAuth platform.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OAuthError {
    /// Platform answered with a non-success status.
    #[error("OAuth provider rejected the request with status {status}")]
    Rejected { status: u16 },

    /// Platform could not be reached.
    #[error("OAuth provider unavailable: {0}")]
    Unavailable(String),

    /// Platform answered with a body we could not use.
    #[error("invalid OAuth provider response: {0}")]
    InvalidResponse(String),
}

impl From<OAuthError> for RelayError {
    fn from(err: OAuthError) -> Self {
        RelayError::UpstreamAuth(err.to_string())
    }
}

/// Port for the external OAuth collaborator.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Consent page URL to redirect the browser to.
    fn authorize_url(&self, intent: AuthorizeIntent) -> String;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, OAuthError>;

    /// Resolve the identity that owns `token`.
    async fn fetch_identity(&self, token: &AccessToken) -> Result<IdentityId, OAuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state_round_trips() {
        let intent = AuthorizeIntent::from_state(AuthorizeIntent::Reset.state());
        assert_eq!(intent, AuthorizeIntent::Reset);
    }

    #[test]
    fn missing_or_unknown_state_means_link() {
        assert_eq!(AuthorizeIntent::from_state(None), AuthorizeIntent::Link);
        assert_eq!(AuthorizeIntent::from_state(Some("xyz")), AuthorizeIntent::Link);
        assert!(AuthorizeIntent::Link.state().is_none());
    }

    #[test]
    fn oauth_errors_surface_as_upstream_auth() {
        let err: RelayError = OAuthError::Rejected { status: 401 }.into();
        assert!(matches!(err, RelayError::UpstreamAuth(_)));
        assert_eq!(err.to_string(), "Authentication error");
    }
}
