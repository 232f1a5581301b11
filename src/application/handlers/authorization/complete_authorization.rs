//! CompleteAuthorizationHandler - Finishes the OAuth round trip.
//!
//! Turns an authorization code into a relay secret: the code is exchanged
//! once with the external platform, the platform names the identity, and the
//! credential store hands back that identity's secret (or a fresh one when
//! the user asked for a reset).

use std::sync::Arc;

use crate::domain::foundation::{ClientSecret, IdentityId, RelayError};
use crate::ports::{AuthorizeIntent, CredentialStore, OAuthProvider};

/// Command built from the callback's query parameters.
#[derive(Debug, Clone, Default)]
pub struct CompleteAuthorizationCommand {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Result of a completed authorization.
#[derive(Debug, Clone)]
pub struct CompleteAuthorizationResult {
    pub identity: IdentityId,
    pub secret: ClientSecret,
    /// True when a new secret replaced the previous one.
    pub rotated: bool,
}

/// Handler for the authorization callback.
pub struct CompleteAuthorizationHandler {
    oauth: Arc<dyn OAuthProvider>,
    credentials: Arc<dyn CredentialStore>,
}

impl CompleteAuthorizationHandler {
    pub fn new(oauth: Arc<dyn OAuthProvider>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self { oauth, credentials }
    }

    pub async fn handle(
        &self,
        cmd: CompleteAuthorizationCommand,
    ) -> Result<CompleteAuthorizationResult, RelayError> {
        // 1. A callback without a code is a failed consent
        let code = cmd
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| RelayError::UpstreamAuth("missing authorization code".into()))?;
        let intent = AuthorizeIntent::from_state(cmd.state.as_deref());

        // 2. Exchange the code and ask the platform who this is
        let token = self.oauth.exchange_code(code).await?;
        let identity = self.oauth.fetch_identity(&token).await?;

        // 3. Bind or rotate the secret
        let rotated = intent == AuthorizeIntent::Reset;
        let secret = if rotated {
            self.credentials.issue(&identity).await?
        } else {
            self.credentials.get_or_create(&identity).await?
        };

        // 4. Remember the platform token alongside the credential
        self.credentials.record_access_token(&identity, &token).await?;

        tracing::info!(%identity, rotated, "Authorization completed");

        Ok(CompleteAuthorizationResult {
            identity,
            secret,
            rotated,
        })
    }
}
