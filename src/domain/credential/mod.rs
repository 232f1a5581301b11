//! Credential binding one identity to its current secret.

use crate::domain::foundation::{AccessToken, ClientSecret, IdentityId, Timestamp};

/// `{identity, secret, external_access_token}` as held by the credential store.
///
/// There is at most one credential per identity; rotating replaces `secret`
/// in place and the previous secret stops resolving immediately.
#[derive(Debug, Clone)]
pub struct Credential {
    pub identity: IdentityId,
    pub secret: ClientSecret,
    pub external_access_token: Option<AccessToken>,
    pub issued_at: Timestamp,
}

impl Credential {
    /// Creates a credential with a freshly generated secret.
    pub fn issue(identity: IdentityId) -> Self {
        Self {
            identity,
            secret: ClientSecret::generate(),
            external_access_token: None,
            issued_at: Timestamp::now(),
        }
    }

    /// Replaces the secret with a freshly generated one, returning the old one.
    pub fn rotate(&mut self) -> ClientSecret {
        self.issued_at = Timestamp::now();
        std::mem::replace(&mut self.secret, ClientSecret::generate())
    }
}
