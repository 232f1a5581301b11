//! WebSocket room management for identity-based message routing.
//!
//! Rooms are keyed by identity, so every device a user has connected
//! receives that user's status events.
//!
//! # Architecture
//!
//! ```text
//! Room: 8035…912        Room: 1122…334
//! ├── connection-a      └── connection-d
//! └── connection-b
//! ```
//!
//! When a status is posted for 8035…912, only connections a and b receive it.

use std::collections::HashMap;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::foundation::{ConnectionId, IdentityId};
use crate::domain::status::StatusEvent;
use crate::ports::{ConnectionHandle, ConnectionRegistry, ConnectionRegistryError, Delivery};

/// Members of one identity's room.
#[derive(Debug, Default)]
struct Room {
    members: HashMap<ConnectionId, ConnectionHandle>,
}

/// In-process [`ConnectionRegistry`] over sharded maps.
///
/// # Thread Safety
///
/// Both maps are `DashMap`s, so locking is per shard rather than global:
/// publishes to different identities rarely contend. A publish holds its
/// room's shard exclusively while it enqueues, which serializes publishes for
/// one identity and keeps every member's queue in publish order. Enqueueing
/// never waits on a socket.
///
/// Lock order is always `memberships` before `rooms`; no path takes them the
/// other way round.
#[derive(Debug, Default)]
pub struct RoomManager {
    /// identity → live members.
    rooms: DashMap<IdentityId, Room>,

    /// connection → identity, for O(1) detach.
    memberships: DashMap<ConnectionId, IdentityId>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identities that currently have at least one connection.
    pub fn active_rooms(&self) -> Vec<IdentityId> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Room the connection is attached to, if any.
    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<IdentityId> {
        self.memberships
            .get(connection_id)
            .map(|entry| entry.value().clone())
    }
}

impl ConnectionRegistry for RoomManager {
    fn attach(
        &self,
        identity: &IdentityId,
        connection: ConnectionHandle,
    ) -> Result<(), ConnectionRegistryError> {
        let connection_id = connection.id();

        match self.memberships.entry(connection_id) {
            Entry::Occupied(_) => Err(ConnectionRegistryError::AlreadyAttached(connection_id)),
            Entry::Vacant(slot) => {
                // Room insert happens while the membership slot is held, so a
                // concurrent detach of this id waits until both maps agree.
                self.rooms
                    .entry(identity.clone())
                    .or_default()
                    .members
                    .insert(connection_id, connection);
                slot.insert(identity.clone());
                Ok(())
            }
        }
    }

    fn detach(&self, connection_id: &ConnectionId) -> bool {
        let Some((_, identity)) = self.memberships.remove(connection_id) else {
            return false;
        };

        if let Some(mut room) = self.rooms.get_mut(&identity) {
            room.members.remove(connection_id);
        }
        // Separate step: the guard above must be released first (same shard).
        self.rooms
            .remove_if(&identity, |_, room| room.members.is_empty());

        true
    }

    fn publish(&self, identity: &IdentityId, event: StatusEvent) -> usize {
        // Exclusive guard: one publish per room at a time.
        let Some(room) = self.rooms.get_mut(identity) else {
            tracing::trace!(%identity, "Publish to empty room");
            return 0;
        };

        let mut delivered = 0;
        for (connection_id, member) in room.members.iter() {
            match member.offer(event.clone()) {
                Delivery::Queued => delivered += 1,
                Delivery::Full => {
                    tracing::warn!(
                        %identity,
                        %connection_id,
                        kind = event.kind().event_name(),
                        "Connection queue full, dropping event"
                    );
                }
                Delivery::Closed => {
                    tracing::debug!(%identity, %connection_id, "Connection closing, skipped");
                }
            }
        }

        delivered
    }

    fn member_count(&self, identity: &IdentityId) -> usize {
        self.rooms
            .get(identity)
            .map(|room| room.members.len())
            .unwrap_or(0)
    }

    fn total_connections(&self) -> usize {
        self.memberships.len()
    }
}
