use flare_core::{ConnectionId, MemberInfo, RoomId};
use std::time::{Duration, Instant};

/// One named room: an ordered member list plus its creation time. All
/// mutation goes through the owning [`RoomDirectory`](super::RoomDirectory),
/// which guarantees a connection id appears at most once.
#[derive(Debug)]
pub struct Room {
    pub room_id: RoomId,
    members: Vec<MemberInfo>,
    created_at: Instant,
}

impl Room {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            members: Vec::new(),
            created_at: Instant::now(),
        }
    }

    /// Adds a member, replacing any existing entry for the same connection.
    pub fn upsert_member(&mut self, member: MemberInfo) {
        match self
            .members
            .iter_mut()
            .find(|m| m.connection_id == member.connection_id)
        {
            Some(existing) => *existing = member,
            None => self.members.push(member),
        }
    }

    /// Removes the member with the given connection id. Returns whether an
    /// entry was actually removed.
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.connection_id != *connection_id);
        self.members.len() != before
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.members
            .iter()
            .any(|m| m.connection_id == *connection_id)
    }

    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&mut self, by: Duration) {
        self.created_at -= by;
    }
}
