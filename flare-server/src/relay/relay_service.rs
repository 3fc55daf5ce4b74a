use crate::config::RelayConfig;
use crate::room::RoomDirectory;
use crate::session::SessionRegistry;
use dashmap::DashMap;
use flare_core::{
    ChatMessage, ClientEvent, ConnectionId, IceServerConfig, MemberInfo, RoomId, ServerEvent,
    SignalError, UserId, now_millis,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Counters reported by the health endpoint.
#[derive(Debug, Clone, Copy)]
pub struct RelayStats {
    pub connected_sockets: usize,
    pub active_rooms: usize,
    pub uptime_secs: u64,
}

struct RelayInner {
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
    sessions: SessionRegistry,
    rooms: RoomDirectory,
    config: RelayConfig,
    started_at: Instant,
}

/// The signaling relay. Owns every piece of server-side state (sessions,
/// rooms, outbound peer channels) and exposes one operation per inbound
/// event kind. Cheap to clone; all clones share the same store.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl RelayService {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                peers: DashMap::new(),
                sessions: SessionRegistry::new(),
                rooms: RoomDirectory::new(),
                config,
                started_at: Instant::now(),
            }),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.config.ice_servers.clone()
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            connected_sockets: self.inner.peers.len(),
            active_rooms: self.inner.rooms.len(),
            uptime_secs: self.inner.started_at.elapsed().as_secs(),
        }
    }

    /// Registers a freshly connected socket: its session record plus the
    /// channel outbound events are pushed into.
    pub fn register(
        &self,
        connection_id: ConnectionId,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) {
        self.inner.peers.insert(connection_id, tx);
        self.inner.sessions.insert(connection_id);
    }

    /// Implicit leave of whatever room the session was in, a distinct
    /// `user-disconnected` notification to the remaining members, then the
    /// session record is destroyed.
    pub fn disconnect(&self, connection_id: ConnectionId) {
        self.inner.peers.remove(&connection_id);

        let Some(session) = self.inner.sessions.remove(&connection_id) else {
            return;
        };
        let Some(room_id) = session.current_room else {
            return;
        };

        let remaining = self.leave_room(connection_id, &room_id);
        let user_id = session
            .user_id
            .unwrap_or_else(|| UserId(format!("user-{connection_id}")));
        info!("User {} disconnected from room {}", user_id, room_id);

        self.send_to_members(&remaining, ServerEvent::RoomUpdate {
            room_id: room_id.clone(),
            clients: remaining.clone(),
        });
        self.send_to_members(&remaining, ServerEvent::UserDisconnected {
            user_id,
            connection_id,
            room_id,
        });
    }

    /// Entry point for one parsed inbound event. Validation failures are
    /// answered with an `error` event; state failures are logged and
    /// swallowed. Nothing here can take the connection down.
    pub fn handle_event(&self, connection_id: ConnectionId, event: ClientEvent) {
        if let Err(err) = self.dispatch(connection_id, event) {
            match err {
                SignalError::Validation(message) => {
                    warn!("Rejected event from {}: {}", connection_id, message);
                    self.send(&connection_id, ServerEvent::Error { message });
                }
                SignalError::State(message) => {
                    debug!("Ignored event from {}: {}", connection_id, message);
                }
                other => warn!("Relay error for {}: {}", connection_id, other),
            }
        }
    }

    pub fn send_error(&self, connection_id: ConnectionId, message: String) {
        self.send(&connection_id, ServerEvent::Error { message });
    }

    /// Drops zero-member rooms older than the configured staleness window.
    pub fn sweep_stale_rooms(&self) -> usize {
        let removed = self
            .inner
            .rooms
            .sweep_stale(self.inner.config.stale_room_timeout);
        for room_id in &removed {
            info!("Swept stale room {}", room_id);
        }
        removed.len()
    }

    fn dispatch(&self, conn: ConnectionId, event: ClientEvent) -> Result<(), SignalError> {
        match event {
            ClientEvent::Join { room_id, user_id } => self.join(conn, room_id, user_id),
            ClientEvent::Leave { room_id } => self.leave(conn, room_id),
            ClientEvent::Offer {
                room_id,
                sdp,
                sender,
                target,
            } => {
                require_room_and_sender(&room_id, &sender)?;
                require_non_empty(&sdp.sdp, "sdp")?;
                self.route_signal(
                    conn,
                    &room_id,
                    target,
                    ServerEvent::Offer {
                        room_id: room_id.clone(),
                        sdp,
                        sender,
                        sender_connection_id: conn,
                    },
                )
            }
            ClientEvent::Answer {
                room_id,
                sdp,
                sender,
                target,
            } => {
                require_room_and_sender(&room_id, &sender)?;
                require_non_empty(&sdp.sdp, "sdp")?;
                self.route_signal(
                    conn,
                    &room_id,
                    target,
                    ServerEvent::Answer {
                        room_id: room_id.clone(),
                        sdp,
                        sender,
                        sender_connection_id: conn,
                    },
                )
            }
            ClientEvent::IceCandidate {
                room_id,
                candidate,
                sender,
                target,
            } => {
                require_room_and_sender(&room_id, &sender)?;
                require_non_empty(&candidate.candidate, "candidate")?;
                self.route_signal(
                    conn,
                    &room_id,
                    target,
                    ServerEvent::IceCandidate {
                        room_id: room_id.clone(),
                        candidate,
                        sender,
                        sender_connection_id: conn,
                    },
                )
            }
            ClientEvent::ChatMessage {
                room_id,
                message,
                sender,
            } => {
                require_room_and_sender(&room_id, &sender)?;
                require_non_empty(&message, "message")?;
                let chat = ChatMessage {
                    sender,
                    message,
                    sender_connection_id: conn,
                    room_id: room_id.clone(),
                    timestamp: now_millis(),
                };
                self.broadcast_to_room(conn, &room_id, ServerEvent::ChatMessage(chat))
            }
            ClientEvent::CallUser {
                room_id,
                target,
                sender,
            } => {
                require_room_and_sender(&room_id, &sender)?;
                self.send_to_connection(target, ServerEvent::IncomingCall {
                    caller: sender,
                    caller_connection_id: conn,
                    room_id,
                })
            }
            ClientEvent::CallAccepted {
                room_id,
                target,
                sender,
            } => {
                require_room_and_sender(&room_id, &sender)?;
                self.send_to_connection(target, ServerEvent::CallAccepted {
                    accepter: sender,
                    accepter_connection_id: conn,
                    room_id,
                })
            }
            ClientEvent::CallRejected {
                room_id,
                target,
                sender,
            } => {
                require_room_and_sender(&room_id, &sender)?;
                self.send_to_connection(target, ServerEvent::CallRejected {
                    rejecter: sender,
                    rejecter_connection_id: conn,
                    room_id,
                })
            }
            ClientEvent::EndCall { room_id, sender } => {
                require_room_and_sender(&room_id, &sender)?;
                self.broadcast_to_room(conn, &room_id, ServerEvent::CallEnded {
                    ender: sender,
                    ender_connection_id: conn,
                    room_id: room_id.clone(),
                })
            }
            ClientEvent::Ping => {
                self.send(&conn, ServerEvent::Pong {
                    timestamp: now_millis(),
                });
                Ok(())
            }
        }
    }

    fn join(&self, conn: ConnectionId, room_id: RoomId, user_id: UserId) -> Result<(), SignalError> {
        if room_id.is_empty() {
            return Err(SignalError::validation("Room ID is required"));
        }
        if user_id.is_empty() {
            return Err(SignalError::validation("User ID is required"));
        }

        // A connection lives in at most one room: joining a new room first
        // leaves the old one and tells its remaining members.
        if let Some(previous) = self.inner.sessions.current_room(&conn)
            && previous != room_id
        {
            let remaining = self.leave_room(conn, &previous);
            self.send_to_members(&remaining, ServerEvent::RoomUpdate {
                room_id: previous,
                clients: remaining.clone(),
            });
        }

        let member = MemberInfo {
            connection_id: conn,
            user_id: user_id.clone(),
            joined_at: now_millis(),
        };
        let clients = self.inner.rooms.join(&room_id, member);
        self.inner
            .sessions
            .set_room(&conn, Some(room_id.clone()), Some(user_id.clone()));

        info!("User {} joined room {}", user_id, room_id);

        self.send(&conn, ServerEvent::Joined {
            room_id: room_id.clone(),
            connection_id: conn,
            clients: clients.clone(),
        });

        let others: Vec<MemberInfo> = clients
            .iter()
            .filter(|m| m.connection_id != conn)
            .cloned()
            .collect();
        self.send_to_members(&others, ServerEvent::RoomUpdate {
            room_id,
            clients,
        });
        Ok(())
    }

    fn leave(&self, conn: ConnectionId, room_id: RoomId) -> Result<(), SignalError> {
        if room_id.is_empty() {
            return Err(SignalError::validation("Room ID is required"));
        }

        let remaining = self.leave_room(conn, &room_id);
        self.send_to_members(&remaining, ServerEvent::RoomUpdate {
            room_id,
            clients: remaining.clone(),
        });
        Ok(())
    }

    /// Removes the connection from the room and clears the session's room
    /// pointer. Returns the members left behind (empty when the room is
    /// unknown or already gone).
    fn leave_room(&self, conn: ConnectionId, room_id: &RoomId) -> Vec<MemberInfo> {
        let remaining = match self.inner.rooms.leave(room_id, &conn) {
            Some(outcome) => outcome.remaining,
            None => Vec::new(),
        };
        if self.inner.sessions.current_room(&conn).as_ref() == Some(room_id) {
            self.inner.sessions.set_room(&conn, None, None);
        }
        remaining
    }

    /// Targeted delivery when `target` is set, otherwise a broadcast to
    /// every other member of the room.
    fn route_signal(
        &self,
        sender_conn: ConnectionId,
        room_id: &RoomId,
        target: Option<ConnectionId>,
        event: ServerEvent,
    ) -> Result<(), SignalError> {
        match target {
            Some(target) => self.send_to_connection(target, event),
            None => self.broadcast_to_room(sender_conn, room_id, event),
        }
    }

    fn broadcast_to_room(
        &self,
        sender_conn: ConnectionId,
        room_id: &RoomId,
        event: ServerEvent,
    ) -> Result<(), SignalError> {
        let Some(members) = self.inner.rooms.members(room_id) else {
            return Err(SignalError::state(format!("unknown room {room_id}")));
        };
        let others: Vec<MemberInfo> = members
            .into_iter()
            .filter(|m| m.connection_id != sender_conn)
            .collect();
        self.send_to_members(&others, event);
        Ok(())
    }

    fn send_to_connection(
        &self,
        target: ConnectionId,
        event: ServerEvent,
    ) -> Result<(), SignalError> {
        if !self.inner.peers.contains_key(&target) {
            return Err(SignalError::state(format!(
                "target connection {target} is gone"
            )));
        }
        self.send(&target, event);
        Ok(())
    }

    fn send_to_members(&self, members: &[MemberInfo], event: ServerEvent) {
        for member in members {
            self.send(&member.connection_id, event.clone());
        }
    }

    fn send(&self, connection_id: &ConnectionId, event: ServerEvent) {
        if let Some(peer) = self.inner.peers.get(connection_id) {
            if peer.send(event).is_err() {
                debug!("Outbound channel for {} is closed", connection_id);
            }
        } else {
            debug!(
                "Attempted to send to disconnected connection {}",
                connection_id
            );
        }
    }
}

fn require_room_and_sender(room_id: &RoomId, sender: &UserId) -> Result<(), SignalError> {
    if room_id.is_empty() {
        return Err(SignalError::validation("Room ID is required"));
    }
    if sender.is_empty() {
        return Err(SignalError::validation("Sender is required"));
    }
    Ok(())
}

fn require_non_empty(value: &str, field: &str) -> Result<(), SignalError> {
    if value.trim().is_empty() {
        return Err(SignalError::validation(format!("{field} is required")));
    }
    Ok(())
}
