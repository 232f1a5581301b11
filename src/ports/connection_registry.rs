//! ConnectionRegistry port - identity rooms of live connections.
//!
//! Every authenticated real-time connection is attached to exactly one room,
//! keyed by the identity it authenticated as. Ingress publishes status events
//! into a room; the registry hands each event to every member's outbound
//! queue.
//!
//! ## Use Case
//!
//! 1. Client opens a socket with its secret
//! 2. Handshake resolves the secret and attaches the connection
//! 3. Producer posts a status update for the same identity
//! 4. Ingress publishes into the identity's room
//! 5. Each member's writer task drains its queue onto the socket
//! 6. On disconnect the [`Attachment`] guard detaches the connection
//!
//! The registry is process-local. Its operations never await: publish only
//! enqueues, so it is safe to call from request handlers without waiting on
//! client sockets.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::foundation::{ConnectionId, IdentityId};
use crate::domain::status::StatusEvent;

/// Errors that can occur in connection registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionRegistryError {
    /// The connection is already a member of a room.
    #[error("connection {0} is already attached")]
    AlreadyAttached(ConnectionId),
}

/// Outcome of offering one event to one connection's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Event is queued for the socket writer.
    Queued,
    /// Member is too slow; its queue is full and the event was dropped for it.
    Full,
    /// Member's receiving side is gone (connection tearing down).
    Closed,
}

/// Sending half of one connection, as held by the registry.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbox: mpsc::Sender<StatusEvent>,
}

impl ConnectionHandle {
    /// Create a handle and the receiver its socket writer drains.
    pub fn channel(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<StatusEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { id, outbox: tx }, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Enqueue without waiting.
    pub fn offer(&self, event: StatusEvent) -> Delivery {
        match self.outbox.try_send(event) {
            Ok(()) => Delivery::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Full,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// Port for room membership and fan-out.
///
/// # Contract
///
/// - `attach`, `detach` and `publish` are safe to call concurrently for any
///   identities.
/// - `publish` never observes a half-attached or half-detached member: a
///   connection whose `attach` returned before `publish` began receives the
///   event; one whose `detach` returned before does not.
/// - For one identity, events are enqueued to every member in publish order.
/// - Publishing to a room with no members is a silent no-op.
pub trait ConnectionRegistry: Send + Sync {
    /// Add a connection to `identity`'s room.
    fn attach(
        &self,
        identity: &IdentityId,
        connection: ConnectionHandle,
    ) -> Result<(), ConnectionRegistryError>;

    /// Remove a connection from whatever room it is in.
    ///
    /// Returns `false` if it was not attached; calling twice is harmless.
    fn detach(&self, connection_id: &ConnectionId) -> bool;

    /// Hand `event` to every connection currently attached under `identity`.
    ///
    /// Returns how many members accepted the event into their queue.
    fn publish(&self, identity: &IdentityId, event: StatusEvent) -> usize;

    /// Number of connections in `identity`'s room.
    fn member_count(&self, identity: &IdentityId) -> usize;

    /// Number of connections across all rooms.
    fn total_connections(&self) -> usize;
}

/// Room membership held for the lifetime of one connection.
///
/// Detaches on drop, so every exit path of a connection task (clean close,
/// socket error, panic, task abort) leaves the room exactly once.
pub struct Attachment {
    registry: Arc<dyn ConnectionRegistry>,
    identity: IdentityId,
    connection_id: ConnectionId,
    detached: bool,
}

impl Attachment {
    /// Attach `connection` under `identity` and return the guard.
    pub fn attach(
        registry: Arc<dyn ConnectionRegistry>,
        identity: IdentityId,
        connection: ConnectionHandle,
    ) -> Result<Self, ConnectionRegistryError> {
        let connection_id = connection.id();
        registry.attach(&identity, connection)?;
        Ok(Self {
            registry,
            identity,
            connection_id,
            detached: false,
        })
    }

    pub fn identity(&self) -> &IdentityId {
        &self.identity
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Detach now instead of waiting for drop.
    pub fn detach(mut self) {
        self.detach_once();
    }

    fn detach_once(&mut self) {
        if !self.detached {
            self.detached = true;
            self.registry.detach(&self.connection_id);
            tracing::debug!(
                identity = %self.identity,
                connection_id = %self.connection_id,
                "Connection detached"
            );
        }
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.detach_once();
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("identity", &self.identity)
            .field("connection_id", &self.connection_id)
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}
