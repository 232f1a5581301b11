//! AdmitConnectionHandler - Decides whether a connection attempt may upgrade.

use std::sync::Arc;

use crate::domain::foundation::{IdentityId, RelayError};
use crate::domain::handshake::{Handshake, RejectReason};
use crate::ports::CredentialStore;

/// Handler that resolves a handshake's claimed secret.
///
/// On success the handshake is `Authenticated` and the caller attaches the
/// connection; on failure it is `Rejected` and the caller refuses the upgrade.
pub struct AdmitConnectionHandler {
    credentials: Arc<dyn CredentialStore>,
}

impl AdmitConnectionHandler {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self { credentials }
    }

    pub async fn handle(
        &self,
        handshake: &mut Handshake,
        claimed: Option<&str>,
    ) -> Result<IdentityId, RelayError> {
        // 1. Secret present?
        let Some(secret) = Handshake::claimed_secret(claimed) else {
            reject(handshake, RejectReason::MissingSecret);
            return Err(RelayError::InvalidSecret);
        };

        // 2. Resolve it
        let identity = match self.credentials.lookup_by_secret(&secret).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                reject(handshake, RejectReason::UnknownSecret);
                return Err(RelayError::InvalidSecret);
            }
            Err(err) => {
                reject(handshake, RejectReason::StoreUnavailable);
                return Err(err.into());
            }
        };

        // 3. Bind the connection to its room for life
        handshake
            .authenticate(identity.clone())
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        Ok(identity)
    }
}

fn reject(handshake: &mut Handshake, reason: RejectReason) {
    if let Err(err) = handshake.reject(reason) {
        tracing::warn!(
            connection_id = %handshake.connection_id(),
            error = %err,
            "Handshake already settled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::credentials::InMemoryCredentialStore;
    use crate::domain::handshake::HandshakePhase;

    async fn setup() -> (AdmitConnectionHandler, String) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let secret = store
            .issue(&IdentityId::new("user-1").unwrap())
            .await
            .unwrap();
        (AdmitConnectionHandler::new(store), secret.into_inner())
    }

    #[tokio::test]
    async fn known_secret_authenticates() {
        let (handler, secret) = setup().await;
        let mut handshake = Handshake::begin();

        let identity = handler.handle(&mut handshake, Some(&secret)).await.unwrap();

        assert_eq!(identity.as_str(), "user-1");
        assert_eq!(handshake.phase(), HandshakePhase::Authenticated);
        assert_eq!(handshake.identity(), Some(&identity));
    }

    #[tokio::test]
    async fn missing_secret_rejects() {
        let (handler, _) = setup().await;
        let mut handshake = Handshake::begin();

        let err = handler.handle(&mut handshake, None).await.unwrap_err();

        assert_eq!(err, RelayError::InvalidSecret);
        assert_eq!(handshake.phase(), HandshakePhase::Rejected);
        assert_eq!(handshake.reject_reason(), Some(RejectReason::MissingSecret));
    }

    #[tokio::test]
    async fn unknown_secret_rejects() {
        let (handler, _) = setup().await;
        let mut handshake = Handshake::begin();

        let err = handler
            .handle(&mut handshake, Some("nope"))
            .await
            .unwrap_err();

        assert_eq!(err, RelayError::InvalidSecret);
        assert_eq!(handshake.reject_reason(), Some(RejectReason::UnknownSecret));
    }

    #[tokio::test]
    async fn handshake_secret_is_not_trimmed() {
        let (handler, secret) = setup().await;
        let mut handshake = Handshake::begin();

        let padded = format!(" {secret}");
        let result = handler.handle(&mut handshake, Some(&padded)).await;

        assert_eq!(result.unwrap_err(), RelayError::InvalidSecret);
    }
}
