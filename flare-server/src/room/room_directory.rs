use crate::room::Room;
use dashmap::DashMap;
use flare_core::{ConnectionId, MemberInfo, RoomId};
use std::time::Duration;
use tracing::info;

/// Result of removing a member from a room.
#[derive(Debug)]
pub struct LeaveOutcome {
    /// Member list after the removal, in join order.
    pub remaining: Vec<MemberInfo>,
    /// Whether the room became empty and was dropped.
    pub room_deleted: bool,
}

/// The in-memory room store. Rooms are created lazily on first join and
/// destroyed when their last member leaves; the sweeper additionally drops
/// zero-member rooms past the staleness window.
///
/// Every mutation of one room's member list happens under that entry's
/// exclusive map guard, so readers never observe a torn list; distinct
/// rooms are mutated concurrently.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: DashMap<RoomId, Room>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) the member in the room, creating the room if
    /// needed. Returns a snapshot of the member list after the join.
    pub fn join(&self, room_id: &RoomId, member: MemberInfo) -> Vec<MemberInfo> {
        let mut room = self
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!("Creating room {}", room_id);
                Room::new(room_id.clone())
            });
        room.upsert_member(member);
        room.members().to_vec()
    }

    /// Removes the member from the room, dropping the room if it becomes
    /// empty. `None` if the room is unknown or the connection was not in it.
    pub fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<LeaveOutcome> {
        let (remaining, now_empty) = {
            let mut room = self.rooms.get_mut(room_id)?;
            if !room.remove_member(connection_id) {
                return None;
            }
            (room.members().to_vec(), room.is_empty())
        };

        // The guard is released above; re-check emptiness so a concurrent
        // join does not lose its room.
        let room_deleted = now_empty
            && self
                .rooms
                .remove_if(room_id, |_, room| room.is_empty())
                .is_some();
        if room_deleted {
            info!("Room {} is empty, deleting", room_id);
        }

        Some(LeaveOutcome {
            remaining,
            room_deleted,
        })
    }

    pub fn members(&self, room_id: &RoomId) -> Option<Vec<MemberInfo>> {
        self.rooms.get(room_id).map(|r| r.members().to_vec())
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Drops every zero-member room older than `stale_after`, returning the
    /// ids of the removed rooms.
    pub fn sweep_stale(&self, stale_after: Duration) -> Vec<RoomId> {
        let mut removed = Vec::new();
        self.rooms.retain(|room_id, room| {
            let stale = room.is_empty() && room.age() >= stale_after;
            if stale {
                removed.push(room_id.clone());
            }
            !stale
        });
        removed
    }

    #[cfg(test)]
    pub(crate) fn insert_aged_empty_room(&self, room_id: RoomId, age: Duration) {
        let mut room = Room::new(room_id.clone());
        room.backdate(age);
        self.rooms.insert(room_id, room);
    }
}
