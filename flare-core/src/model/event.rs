use crate::model::chat::ChatMessage;
use crate::model::ids::{ConnectionId, RoomId, UserId};
use crate::model::member::MemberInfo;
use crate::model::sdp::{CandidateInit, SessionDescription};
use serde::{Deserialize, Serialize};

/// Everything a client may send to the relay. Deserialization enforces the
/// shape of each kind; a frame that does not parse is answered with an
/// `error` event and dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    Join {
        room_id: RoomId,
        user_id: UserId,
    },
    Leave {
        room_id: RoomId,
    },
    Offer {
        room_id: RoomId,
        sdp: SessionDescription,
        sender: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ConnectionId>,
    },
    Answer {
        room_id: RoomId,
        sdp: SessionDescription,
        sender: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ConnectionId>,
    },
    IceCandidate {
        room_id: RoomId,
        candidate: CandidateInit,
        sender: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ConnectionId>,
    },
    ChatMessage {
        room_id: RoomId,
        message: String,
        sender: UserId,
    },
    CallUser {
        room_id: RoomId,
        target: ConnectionId,
        sender: UserId,
    },
    CallAccepted {
        room_id: RoomId,
        target: ConnectionId,
        sender: UserId,
    },
    CallRejected {
        room_id: RoomId,
        target: ConnectionId,
        sender: UserId,
    },
    EndCall {
        room_id: RoomId,
        sender: UserId,
    },
    Ping,
}

/// Everything the relay may send to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    Joined {
        room_id: RoomId,
        connection_id: ConnectionId,
        clients: Vec<MemberInfo>,
    },
    #[serde(rename = "room:update")]
    RoomUpdate {
        room_id: RoomId,
        clients: Vec<MemberInfo>,
    },
    UserDisconnected {
        user_id: UserId,
        connection_id: ConnectionId,
        room_id: RoomId,
    },
    Offer {
        room_id: RoomId,
        sdp: SessionDescription,
        sender: UserId,
        sender_connection_id: ConnectionId,
    },
    Answer {
        room_id: RoomId,
        sdp: SessionDescription,
        sender: UserId,
        sender_connection_id: ConnectionId,
    },
    IceCandidate {
        room_id: RoomId,
        candidate: CandidateInit,
        sender: UserId,
        sender_connection_id: ConnectionId,
    },
    ChatMessage(ChatMessage),
    IncomingCall {
        caller: UserId,
        caller_connection_id: ConnectionId,
        room_id: RoomId,
    },
    CallAccepted {
        accepter: UserId,
        accepter_connection_id: ConnectionId,
        room_id: RoomId,
    },
    CallRejected {
        rejecter: UserId,
        rejecter_connection_id: ConnectionId,
        room_id: RoomId,
    },
    CallEnded {
        ender: UserId,
        ender_connection_id: ConnectionId,
        room_id: RoomId,
    },
    Pong {
        timestamp: u64,
    },
    Error {
        message: String,
    },
}
