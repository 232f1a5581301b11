//! Mock OAuth provider for testing.
//!
//! # Example
//!
//! ```ignore
//! let oauth = MockOAuthProvider::new().with_grant("code-1", "token-1", "user-1");
//! let token = oauth.exchange_code("code-1").await?;
//! assert_eq!(oauth.fetch_identity(&token).await?.as_str(), "user-1");
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::foundation::{AccessToken, IdentityId};
use crate::ports::{AuthorizeIntent, OAuthError, OAuthProvider};

/// Consent page the mock redirects to.
pub const MOCK_AUTHORIZE_URL: &str = "https://oauth.test/authorize";

/// Mock OAuth provider.
///
/// Codes are single-use, like real authorization codes.
#[derive(Debug, Default)]
pub struct MockOAuthProvider {
    /// code → token
    codes: RwLock<HashMap<String, String>>,
    /// token → identity
    identities: RwLock<HashMap<String, String>>,
    force_status: RwLock<Option<u16>>,
}

impl MockOAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `code`, exchanging it for `token`, which belongs to `identity`.
    pub fn with_grant(
        self,
        code: impl Into<String>,
        token: impl Into<String>,
        identity: impl Into<String>,
    ) -> Self {
        let token = token.into();
        self.codes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(code.into(), token.clone());
        self.identities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token, identity.into());
        self
    }

    /// Make every call fail as if the platform answered `status`.
    pub fn fail_with_status(&self, status: u16) {
        *self
            .force_status
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(status);
    }

    fn forced(&self) -> Result<(), OAuthError> {
        match *self
            .force_status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
        {
            Some(status) => Err(OAuthError::Rejected { status }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl OAuthProvider for MockOAuthProvider {
    fn authorize_url(&self, intent: AuthorizeIntent) -> String {
        match intent.state() {
            Some(state) => format!("{}?state={}", MOCK_AUTHORIZE_URL, state),
            None => MOCK_AUTHORIZE_URL.to_string(),
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, OAuthError> {
        self.forced()?;
        self.codes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(code)
            .map(AccessToken::new)
            .ok_or(OAuthError::Rejected { status: 400 })
    }

    async fn fetch_identity(&self, token: &AccessToken) -> Result<IdentityId, OAuthError> {
        self.forced()?;
        let identities = self
            .identities
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let raw = identities
            .get(token.expose())
            .ok_or(OAuthError::Rejected { status: 401 })?;
        IdentityId::new(raw.as_str()).map_err(|e| OAuthError::InvalidResponse(e.to_string()))
    }
}
