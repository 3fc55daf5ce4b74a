use dashmap::DashMap;
use flare_core::{ConnectionId, RoomId, UserId, now_millis};

/// Per-connection record, created on connect and destroyed on disconnect.
/// `current_room` tracks at most one membership at a time.
#[derive(Debug, Clone)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub user_id: Option<UserId>,
    pub current_room: Option<RoomId>,
    pub connected_at: u64,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, connection_id: ConnectionId) {
        self.sessions.insert(
            connection_id,
            Session {
                connection_id,
                user_id: None,
                current_room: None,
                connected_at: now_millis(),
            },
        );
    }

    pub fn remove(&self, connection_id: &ConnectionId) -> Option<Session> {
        self.sessions.remove(connection_id).map(|(_, s)| s)
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<Session> {
        self.sessions.get(connection_id).map(|s| s.clone())
    }

    pub fn current_room(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.sessions
            .get(connection_id)
            .and_then(|s| s.current_room.clone())
    }

    /// Records the room the connection is now in (or `None` after leaving).
    pub fn set_room(&self, connection_id: &ConnectionId, room: Option<RoomId>, user: Option<UserId>) {
        if let Some(mut session) = self.sessions.get_mut(connection_id) {
            session.current_room = room;
            if user.is_some() {
                session.user_id = user;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
