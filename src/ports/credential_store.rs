//! CredentialStore port - durable identity ↔ secret bindings.
//!
//! The store is the only component allowed to mint or invalidate secrets.
//! `lookup_by_secret` sits on the hot path (every ingress request and every
//! handshake) and must be index-backed in every implementation.
//!
//! ## Concurrency
//!
//! Calls for different identities never block each other. Concurrent
//! `issue` calls for the same identity race and the last writer wins; this
//! path is driven by a human completing an authorization flow, not by
//! traffic.

use async_trait::async_trait;

use crate::domain::foundation::{AccessToken, ClientSecret, IdentityId, RelayError};

/// Errors that can occur in credential store operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialStoreError {
    /// Backend could not be reached or the write failed.
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    /// No credential exists for the identity.
    #[error("no credential for identity {0}")]
    NotFound(IdentityId),

    /// A stored row could not be mapped back into domain types.
    #[error("corrupt credential record: {0}")]
    Corrupt(String),
}

impl From<CredentialStoreError> for RelayError {
    fn from(err: CredentialStoreError) -> Self {
        RelayError::Storage(err.to_string())
    }
}

/// Port for persisting credentials.
///
/// # Example
///
/// ```ignore
/// let secret = store.issue(&identity).await?;
/// assert_eq!(store.lookup_by_secret(&secret).await?, Some(identity));
/// ```
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Generate a fresh secret for `identity`, replacing any existing one.
    ///
    /// The previous secret stops resolving as soon as this returns.
    async fn issue(&self, identity: &IdentityId) -> Result<ClientSecret, CredentialStoreError>;

    /// Resolve a presented secret to the identity it is bound to.
    ///
    /// Exact match only. Returns `None` for unknown or rotated-out secrets.
    async fn lookup_by_secret(
        &self,
        secret: &ClientSecret,
    ) -> Result<Option<IdentityId>, CredentialStoreError>;

    /// Return the identity's current secret, issuing one if none exists.
    async fn get_or_create(
        &self,
        identity: &IdentityId,
    ) -> Result<ClientSecret, CredentialStoreError>;

    /// Remember the last external access token seen for `identity`.
    ///
    /// Returns `NotFound` if the identity has no credential yet.
    async fn record_access_token(
        &self,
        identity: &IdentityId,
        token: &AccessToken,
    ) -> Result<(), CredentialStoreError>;

    /// Last external access token recorded for `identity`, if any.
    async fn access_token(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<AccessToken>, CredentialStoreError>;
}
