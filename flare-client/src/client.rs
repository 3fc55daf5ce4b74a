use crate::config::ClientConfig;
use crate::observer::CallObserver;
use crate::orchestrator::{Orchestrator, OrchestratorHandle};
use crate::router::MessageRouter;
use crate::signaling::{SignalingChannel, WsSignaling};
use crate::transport::{PeerConnectionFactory, WebrtcPeerFactory};
use flare_core::{ClientEvent, ConnectionId, ServerEvent, SignalError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// One video-call participant: the signaling connection, the message
/// router and the connection orchestrator wired together. Dropping the
/// client does not announce anything; call [`disconnect`] for a clean
/// exit.
///
/// [`disconnect`]: CallClient::disconnect
pub struct CallClient {
    config: ClientConfig,
    handle: OrchestratorHandle,
    signaling: Arc<dyn SignalingChannel>,
    orchestrator_task: JoinHandle<()>,
    router_task: JoinHandle<()>,
}

impl CallClient {
    /// Connects to the relay, joins the configured room and starts the
    /// background tasks. Fails explicitly when the signaling handshake
    /// does not complete within the configured timeout.
    pub async fn connect(
        config: ClientConfig,
        observer: Arc<dyn CallObserver>,
    ) -> Result<Self, SignalError> {
        let factory = Arc::new(WebrtcPeerFactory::new(config.ice_servers.clone()));
        Self::connect_with_factory(config, observer, factory).await
    }

    /// Same as [`connect`] but with a custom peer-connection factory.
    ///
    /// [`connect`]: CallClient::connect
    pub async fn connect_with_factory(
        config: ClientConfig,
        observer: Arc<dyn CallObserver>,
        factory: Arc<dyn PeerConnectionFactory>,
    ) -> Result<Self, SignalError> {
        info!("Connecting to signaling relay at {}", config.signaling_url);
        let (signaling, events) =
            WsSignaling::connect(&config.signaling_url, config.connect_timeout).await?;
        Self::assemble(config, observer, factory, signaling, events).await
    }

    /// Wires a client over an arbitrary signaling transport.
    pub async fn assemble(
        config: ClientConfig,
        observer: Arc<dyn CallObserver>,
        factory: Arc<dyn PeerConnectionFactory>,
        signaling: Arc<dyn SignalingChannel>,
        events: mpsc::Receiver<ServerEvent>,
    ) -> Result<Self, SignalError> {
        let (orchestrator, inputs, handle) = Orchestrator::new(
            config.clone(),
            signaling.clone(),
            factory,
            observer.clone(),
        );
        let orchestrator_task = tokio::spawn(orchestrator.run());
        let router_task = MessageRouter::new(inputs, observer).spawn(events);

        signaling
            .send(ClientEvent::Join {
                room_id: config.room_id.clone(),
                user_id: config.user_id.clone(),
            })
            .await?;

        Ok(Self {
            config,
            handle,
            signaling,
            orchestrator_task,
            router_task,
        })
    }

    pub fn orchestrator(&self) -> &OrchestratorHandle {
        &self.handle
    }

    pub async fn toggle_audio(&self) {
        self.handle.toggle_audio().await;
    }

    pub async fn toggle_video(&self) {
        self.handle.toggle_video().await;
    }

    pub async fn switch_camera(&self) {
        self.handle.switch_camera().await;
    }

    pub async fn end_call(&self) {
        self.handle.end_call().await;
    }

    /// Rings another connection in the room.
    pub async fn call_user(&self, target: ConnectionId) -> Result<(), SignalError> {
        self.signaling
            .send(ClientEvent::CallUser {
                room_id: self.config.room_id.clone(),
                target,
                sender: self.config.user_id.clone(),
            })
            .await
    }

    pub async fn accept_call(&self, caller: ConnectionId) -> Result<(), SignalError> {
        self.signaling
            .send(ClientEvent::CallAccepted {
                room_id: self.config.room_id.clone(),
                target: caller,
                sender: self.config.user_id.clone(),
            })
            .await
    }

    pub async fn reject_call(&self, caller: ConnectionId) -> Result<(), SignalError> {
        self.signaling
            .send(ClientEvent::CallRejected {
                room_id: self.config.room_id.clone(),
                target: caller,
                sender: self.config.user_id.clone(),
            })
            .await
    }

    /// Sends a chat line through the relay, which stamps the receive time.
    pub async fn send_chat(&self, message: impl Into<String>) -> Result<(), SignalError> {
        self.signaling
            .send(ClientEvent::ChatMessage {
                room_id: self.config.room_id.clone(),
                message: message.into(),
                sender: self.config.user_id.clone(),
            })
            .await
    }

    /// Leaves the room, tears the orchestrator down and stops the
    /// background tasks.
    pub async fn disconnect(self) {
        let _ = self
            .signaling
            .send(ClientEvent::Leave {
                room_id: self.config.room_id.clone(),
            })
            .await;

        self.handle.teardown().await;
        self.handle.shutdown().await;

        let _ = self.orchestrator_task.await;
        self.router_task.abort();
        info!("Call client disconnected");
    }
}
