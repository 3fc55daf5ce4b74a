use crate::observer::{CallEvent, CallEventData, CallObserver};
use crate::orchestrator::OrchestratorInput;
use flare_core::ServerEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Pure demultiplexer: each relay event goes to the orchestrator, to the
/// call-event observer or to the chat observer, at most once. Events that
/// have nowhere to go are dropped with a diagnostic and never become a
/// peer-connection state change.
pub struct MessageRouter {
    orchestrator: mpsc::Sender<OrchestratorInput>,
    observer: Arc<dyn CallObserver>,
}

impl MessageRouter {
    pub fn new(
        orchestrator: mpsc::Sender<OrchestratorInput>,
        observer: Arc<dyn CallObserver>,
    ) -> Self {
        Self {
            orchestrator,
            observer,
        }
    }

    /// Consumes the inbound event stream until the channel closes.
    pub fn spawn(self, mut events: mpsc::Receiver<ServerEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                self.route(event).await;
            }
            debug!("Signaling event stream ended");
        })
    }

    pub async fn route(&self, event: ServerEvent) {
        match event {
            ServerEvent::Joined {
                connection_id,
                clients,
                ..
            } => {
                self.forward(OrchestratorInput::Joined {
                    connection_id,
                    members: clients,
                })
                .await;
            }
            ServerEvent::RoomUpdate { clients, .. } => {
                self.forward(OrchestratorInput::RoomUpdate { members: clients })
                    .await;
            }
            ServerEvent::Offer {
                sdp,
                sender,
                sender_connection_id,
                ..
            } => {
                self.forward(OrchestratorInput::Offer {
                    sdp,
                    sender,
                    sender_connection_id,
                })
                .await;
            }
            ServerEvent::Answer { sdp, sender, .. } => {
                self.forward(OrchestratorInput::Answer { sdp, sender }).await;
            }
            ServerEvent::IceCandidate { candidate, .. } => {
                self.forward(OrchestratorInput::Candidate { candidate }).await;
            }
            ServerEvent::ChatMessage(message) => {
                self.observer.on_chat_message(message).await;
            }
            ServerEvent::IncomingCall {
                caller,
                caller_connection_id,
                room_id,
            } => {
                self.observer
                    .on_call_event(CallEvent::IncomingCall, CallEventData {
                        user_id: Some(caller),
                        connection_id: Some(caller_connection_id),
                        room_id: Some(room_id),
                    })
                    .await;
            }
            ServerEvent::CallAccepted {
                accepter,
                accepter_connection_id,
                room_id,
            } => {
                self.observer
                    .on_call_event(CallEvent::CallAccepted, CallEventData {
                        user_id: Some(accepter),
                        connection_id: Some(accepter_connection_id),
                        room_id: Some(room_id),
                    })
                    .await;
            }
            ServerEvent::CallRejected {
                rejecter,
                rejecter_connection_id,
                room_id,
            } => {
                self.observer
                    .on_call_event(CallEvent::CallRejected, CallEventData {
                        user_id: Some(rejecter),
                        connection_id: Some(rejecter_connection_id),
                        room_id: Some(room_id),
                    })
                    .await;
            }
            ServerEvent::CallEnded {
                ender,
                ender_connection_id,
                room_id,
            } => {
                self.observer
                    .on_call_event(CallEvent::CallEnded, CallEventData {
                        user_id: Some(ender),
                        connection_id: Some(ender_connection_id),
                        room_id: Some(room_id),
                    })
                    .await;
            }
            ServerEvent::UserDisconnected {
                user_id,
                connection_id,
                room_id,
            } => {
                self.observer
                    .on_call_event(CallEvent::UserDisconnected, CallEventData {
                        user_id: Some(user_id),
                        connection_id: Some(connection_id),
                        room_id: Some(room_id),
                    })
                    .await;
            }
            ServerEvent::Pong { timestamp } => {
                debug!("Pong from relay at {}", timestamp);
            }
            ServerEvent::Error { message } => {
                warn!("Relay reported an error: {}", message);
            }
        }
    }

    async fn forward(&self, input: OrchestratorInput) {
        if self.orchestrator.send(input).await.is_err() {
            debug!("Orchestrator is gone, dropping event");
        }
    }
}
