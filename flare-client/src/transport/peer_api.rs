use crate::transport::LocalMedia;
use async_trait::async_trait;
use flare_core::{CandidateInit, SessionDescription, SignalError};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Connection states reported by the underlying peer-connection primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// Descriptor of a remote media stream surfaced by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub stream_id: String,
    pub track_id: String,
    pub kind: MediaKind,
}

/// Asynchronous notification out of a peer connection. Tagged with the
/// negotiation generation that created the connection so completions that
/// land after a teardown can be discarded instead of applied to stale
/// state.
#[derive(Debug, Clone)]
pub struct PeerEvent {
    pub generation: u64,
    pub kind: PeerEventKind,
}

#[derive(Debug, Clone)]
pub enum PeerEventKind {
    StateChanged(PeerConnectionState),
    CandidateGenerated(CandidateInit),
    RemoteStreamAdded(RemoteStream),
}

/// The narrow interface the orchestrator drives on the media library.
#[async_trait]
pub trait PeerConnectionHandle: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, SignalError>;
    async fn create_answer(&self) -> Result<SessionDescription, SignalError>;
    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), SignalError>;
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), SignalError>;
    async fn add_ice_candidate(&self, candidate: CandidateInit) -> Result<(), SignalError>;
    async fn close(&self);
}

/// Working set of one negotiation attempt: the connection plus the local
/// media attached to it.
pub struct PeerParts {
    pub connection: Arc<dyn PeerConnectionHandle>,
    pub media: Arc<dyn LocalMedia>,
}

/// Builds peer connections wired to push [`PeerEvent`]s into the
/// orchestrator's event channel.
#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    async fn create(
        &self,
        generation: u64,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<PeerParts, SignalError>;
}
