use crate::orchestrator::ConnectionState;
use crate::transport::{LocalMedia, RemoteStream};
use async_trait::async_trait;
use flare_core::{ChatMessage, ConnectionId, MemberInfo, RoomId, UserId};
use std::sync::Arc;

/// Call-control notifications forwarded to the observer unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallEvent {
    IncomingCall,
    CallAccepted,
    CallRejected,
    CallEnded,
    UserDisconnected,
}

#[derive(Debug, Clone, Default)]
pub struct CallEventData {
    pub user_id: Option<UserId>,
    pub connection_id: Option<ConnectionId>,
    pub room_id: Option<RoomId>,
}

/// The fixed set of notifications the core emits. At most one invocation
/// per state transition; implementations are expected to return quickly.
#[async_trait]
pub trait CallObserver: Send + Sync {
    async fn on_local_stream(&self, _media: Arc<dyn LocalMedia>) {}
    async fn on_remote_stream(&self, _stream: RemoteStream) {}
    async fn on_connection_state(&self, _state: ConnectionState) {}
    /// Fired when a bounded reconnect is scheduled after a failure.
    async fn on_reconnecting(&self, _attempt: u32) {}
    async fn on_chat_message(&self, _message: ChatMessage) {}
    async fn on_room_update(&self, _members: Vec<MemberInfo>) {}
    async fn on_call_event(&self, _event: CallEvent, _data: CallEventData) {}
}
