use crate::model::ids::{ConnectionId, RoomId, UserId};
use serde::{Deserialize, Serialize};

/// An immutable chat message. `timestamp` is stamped by the relay at
/// receive time when the message is not delivered peer-to-peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender: UserId,
    pub message: String,
    pub sender_connection_id: ConnectionId,
    pub room_id: RoomId,
    pub timestamp: u64,
}
