//! Group registry: which connections are in which room.
//!
//! ```text
//! rooms                      owner
//! Room 12 ─┬─ conn-a         conn-a → 12
//!          └─ conn-b         conn-b → 12
//! Room 40 ─── conn-c         conn-c → 40
//! ```
//!
//! # Lock discipline
//!
//! Both maps live behind one `RwLock` and are only ever mutated together
//! under the write guard, so no reader can observe them out of sync. No
//! I/O happens while the lock is held; sockets are closed after release.
//!
//! Invariants:
//! - a room entry exists iff its member set is non-empty
//! - a connection is in at most one room's set, and `owner` agrees

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::foundation::{ConnectionId, RoomId};

use super::connection::Connection;

#[derive(Default)]
struct RegistryState {
    rooms: HashMap<RoomId, HashMap<ConnectionId, Arc<Connection>>>,
    owner: HashMap<ConnectionId, RoomId>,
}

impl RegistryState {
    fn remove_from_room(&mut self, room_id: RoomId, conn_id: &ConnectionId) -> Option<Arc<Connection>> {
        let members = self.rooms.get_mut(&room_id)?;
        let removed = members.remove(conn_id);
        if members.is_empty() {
            self.rooms.remove(&room_id);
        }
        removed
    }
}

/// Registry of live connections grouped by room.
#[derive(Default)]
pub struct GroupRegistry {
    state: RwLock<RegistryState>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room, creating the room on first member.
    ///
    /// Registering the same connection again is a no-op. A connection
    /// registered under a different room is moved.
    pub async fn register(&self, room_id: RoomId, conn: Arc<Connection>) {
        let conn_id = conn.id();
        let mut state = self.state.write().await;

        if let Some(previous) = state.owner.get(&conn_id).copied() {
            if previous == room_id {
                return;
            }
            state.remove_from_room(previous, &conn_id);
        }

        state.rooms.entry(room_id).or_default().insert(conn_id, conn);
        state.owner.insert(conn_id, room_id);
    }

    /// Snapshot of the current members of a room.
    ///
    /// Returns `None` when the room has no members. The snapshot does not
    /// follow later joins or leaves.
    pub async fn members_of(&self, room_id: RoomId) -> Option<Vec<Arc<Connection>>> {
        let state = self.state.read().await;
        state
            .rooms
            .get(&room_id)
            .map(|members| members.values().cloned().collect())
    }

    /// Remove a connection and close it.
    ///
    /// Returns false if the connection was not registered, which makes a
    /// second teardown of the same connection a no-op. The socket is closed
    /// exactly once, by the call that removed it.
    pub async fn unregister(&self, conn_id: &ConnectionId) -> bool {
        let removed = {
            let mut state = self.state.write().await;
            let Some(room_id) = state.owner.remove(conn_id) else {
                return false;
            };
            state.remove_from_room(room_id, conn_id)
        };

        if let Some(conn) = removed {
            tracing::debug!(
                connection_id = %conn_id,
                room_id = %conn.room_id(),
                "Connection left room"
            );
            conn.close().await;
        }
        true
    }

    /// Room currently owning a connection.
    pub async fn room_of(&self, conn_id: &ConnectionId) -> Option<RoomId> {
        self.state.read().await.owner.get(conn_id).copied()
    }

    /// Number of rooms with at least one member.
    pub async fn room_count(&self) -> usize {
        self.state.read().await.rooms.len()
    }

    /// Number of registered connections across all rooms.
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.owner.len()
    }

    /// Rooms that currently have at least one member.
    pub async fn active_rooms(&self) -> Vec<RoomId> {
        self.state.read().await.rooms.keys().copied().collect()
    }

    /// Check that the room map and the owner map agree.
    pub async fn is_consistent(&self) -> bool {
        let state = self.state.read().await;

        let rooms_agree = state.rooms.iter().all(|(room_id, members)| {
            !members.is_empty()
                && members
                    .keys()
                    .all(|conn_id| state.owner.get(conn_id) == Some(room_id))
        });
        let owners_agree = state.owner.iter().all(|(conn_id, room_id)| {
            state
                .rooms
                .get(room_id)
                .is_some_and(|members| members.contains_key(conn_id))
        });

        rooms_agree && owners_agree
    }
}
