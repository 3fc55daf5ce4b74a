mod media;
mod peer_api;
mod webrtc_peer;

pub use media::*;
pub use peer_api::*;
pub use webrtc_peer::*;
