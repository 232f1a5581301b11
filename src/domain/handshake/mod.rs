//! Handshake lifecycle for one real-time connection attempt.
//!
//! ```text
//!            ┌──────────────► Rejected   (secret absent / unknown / store down)
//!  Pending ──┤
//!            └──────────────► Authenticated ──► Closed
//!                              (attached)       (detached, exactly once)
//! ```
//!
//! The transport adapter drives these transitions: it resolves the claimed
//! secret, admits or refuses the upgrade, and closes the handshake when the
//! socket ends for any reason.

use serde::Serialize;

use crate::domain::foundation::{
    ClientSecret, ConnectionId, IdentityId, StateMachine, ValidationError,
};

/// Phase of a connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakePhase {
    Pending,
    Authenticated,
    Rejected,
    Closed,
}

impl StateMachine for HandshakePhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use HandshakePhase::*;
        matches!(
            (self, target),
            (Pending, Authenticated) | (Pending, Rejected) | (Authenticated, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use HandshakePhase::*;
        match self {
            Pending => vec![Authenticated, Rejected],
            Authenticated => vec![Closed],
            Rejected | Closed => vec![],
        }
    }
}

/// Why an attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingSecret,
    UnknownSecret,
    /// Credential store could not answer; the client may retry.
    StoreUnavailable,
}

/// One connection attempt and, once admitted, the connection it became.
#[derive(Debug, Clone)]
pub struct Handshake {
    connection_id: ConnectionId,
    phase: HandshakePhase,
    identity: Option<IdentityId>,
    reject_reason: Option<RejectReason>,
}

impl Handshake {
    /// Starts a new attempt in `Pending`.
    pub fn begin() -> Self {
        Self {
            connection_id: ConnectionId::new(),
            phase: HandshakePhase::Pending,
            identity: None,
            reject_reason: None,
        }
    }

    /// Extracts the claimed secret from connection parameters.
    ///
    /// An empty value counts as absent.
    pub fn claimed_secret(raw: Option<&str>) -> Option<ClientSecret> {
        raw.filter(|s| !s.is_empty()).map(ClientSecret::from_presented)
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    /// Identity the connection authenticated as, once `Authenticated`.
    pub fn identity(&self) -> Option<&IdentityId> {
        self.identity.as_ref()
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        self.reject_reason
    }

    /// `Pending -> Authenticated`, binding the connection to its room for life.
    pub fn authenticate(&mut self, identity: IdentityId) -> Result<(), ValidationError> {
        self.phase = self.phase.transition_to(HandshakePhase::Authenticated)?;
        self.identity = Some(identity);
        Ok(())
    }

    /// `Pending -> Rejected`.
    pub fn reject(&mut self, reason: RejectReason) -> Result<(), ValidationError> {
        self.phase = self.phase.transition_to(HandshakePhase::Rejected)?;
        self.reject_reason = Some(reason);
        Ok(())
    }

    /// `Authenticated -> Closed`. Fails on a second call.
    pub fn close(&mut self) -> Result<(), ValidationError> {
        self.phase = self.phase.transition_to(HandshakePhase::Closed)?;
        Ok(())
    }
}
