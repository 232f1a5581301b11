//! PublishStatusHandler - Command handler for the ingress path.
//!
//! Validates a producer's request, resolves the presented secret to an
//! identity and hands the resulting event to that identity's room. The
//! handler returns as soon as the event is queued; it never waits for
//! clients to receive it.

use std::sync::Arc;

use crate::domain::foundation::{ClientSecret, IdentityId, RelayError};
use crate::domain::status::{StatusEvent, StatusEventKind, StatusMetadata, StatusUpdate};
use crate::ports::{ConnectionRegistry, CredentialStore};

/// Command to publish a status event, as received from a producer.
///
/// Fields are raw so the handler can apply the validation order itself.
#[derive(Debug, Clone, Default)]
pub struct PublishStatusCommand {
    pub secret: Option<String>,
    pub clear: bool,
    pub details: Option<String>,
    pub state: Option<String>,
    pub service: Option<String>,
    pub metadata: Option<StatusMetadata>,
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishStatusResult {
    pub identity: IdentityId,
    pub kind: StatusEventKind,
    /// Connections that accepted the event into their queue.
    pub delivered: usize,
}

/// Handler for publishing status events.
pub struct PublishStatusHandler {
    credentials: Arc<dyn CredentialStore>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl PublishStatusHandler {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        registry: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self {
            credentials,
            registry,
        }
    }

    pub async fn handle(&self, cmd: PublishStatusCommand) -> Result<PublishStatusResult, RelayError> {
        // 1. Secret must be present
        let secret = cmd
            .secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(RelayError::MissingParameters)?;

        // 2. Build the event; payload fields are ignored for a clear
        let event = if cmd.clear {
            StatusEvent::Clear
        } else {
            let details = non_empty(cmd.details).ok_or(RelayError::MissingParameters)?;
            let state = non_empty(cmd.state).ok_or(RelayError::MissingParameters)?;
            StatusEvent::Update(StatusUpdate {
                details,
                state,
                service: cmd.service,
                metadata: cmd.metadata,
            })
        };

        // 3. Resolve secret (trimmed, exact match)
        let presented = ClientSecret::from_presented(secret.trim());
        let identity = self
            .credentials
            .lookup_by_secret(&presented)
            .await?
            .ok_or(RelayError::InvalidSecret)?;

        // 4. Fan out
        let kind = event.kind();
        let delivered = self.registry.publish(&identity, event);

        tracing::debug!(
            %identity,
            event = kind.event_name(),
            delivered,
            "Status published"
        );

        Ok(PublishStatusResult {
            identity,
            kind,
            delivered,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
