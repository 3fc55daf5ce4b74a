mod chat;
mod event;
mod ice;
mod ids;
mod member;
mod sdp;

pub use chat::ChatMessage;
pub use event::{ClientEvent, ServerEvent};
pub use ice::{IceServerConfig, default_ice_servers};
pub use ids::{ConnectionId, RoomId, UserId};
pub use member::MemberInfo;
pub use sdp::{CandidateInit, SdpKind, SessionDescription};

/// Milliseconds since the Unix epoch, as stamped on relayed chat messages
/// and member descriptors.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
