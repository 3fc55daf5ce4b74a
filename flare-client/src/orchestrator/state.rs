use crate::transport::{LocalMedia, PeerConnectionHandle};
use std::sync::Arc;

/// Orchestrator-level connection lifecycle. `Closed` is terminal and only
/// reached through an explicit teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Which side of the offer/answer exchange this participant is on.
/// Determined by arrival order: whoever observes the other member first
/// calls; whoever receives an offer answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingRole {
    Undetermined,
    Caller,
    Answerer,
}

/// Working state of one peer-connection attempt. Replaced wholesale on
/// cleanup, never partially reset.
pub struct PeerSession {
    pub generation: u64,
    pub connection: Arc<dyn PeerConnectionHandle>,
    pub media: Arc<dyn LocalMedia>,
    pub local_description_set: bool,
    pub remote_description_set: bool,
}
