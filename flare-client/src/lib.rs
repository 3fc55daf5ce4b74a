pub mod buffer;
pub mod client;
pub mod config;
pub mod observer;
pub mod orchestrator;
pub mod router;
pub mod signaling;
pub mod transport;

pub use buffer::CandidateBuffer;
pub use client::CallClient;
pub use config::{ClientConfig, RetryPolicy};
pub use observer::{CallEvent, CallEventData, CallObserver};
pub use orchestrator::{
    ConnectionState, Orchestrator, OrchestratorCommand, OrchestratorHandle, OrchestratorInput,
    SignalingRole,
};
pub use router::MessageRouter;
pub use signaling::{SignalingChannel, WsSignaling};
pub use transport::{
    LocalMedia, MediaKind, PeerConnectionFactory, PeerConnectionHandle, PeerConnectionState,
    PeerEvent, PeerEventKind, PeerParts, RemoteStream, WebrtcPeerFactory,
};
