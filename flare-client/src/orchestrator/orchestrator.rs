use crate::buffer::CandidateBuffer;
use crate::config::ClientConfig;
use crate::observer::CallObserver;
use crate::orchestrator::{ConnectionState, PeerSession, SignalingRole};
use crate::signaling::SignalingChannel;
use crate::transport::{
    PeerConnectionFactory, PeerConnectionHandle, PeerConnectionState, PeerEvent, PeerEventKind,
};
use flare_core::{
    CandidateInit, ClientEvent, ConnectionId, MemberInfo, SessionDescription, SignalError, UserId,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Inbound signaling demultiplexed by the message router.
#[derive(Debug)]
pub enum OrchestratorInput {
    Joined {
        connection_id: ConnectionId,
        members: Vec<MemberInfo>,
    },
    RoomUpdate {
        members: Vec<MemberInfo>,
    },
    Offer {
        sdp: SessionDescription,
        sender: UserId,
        sender_connection_id: ConnectionId,
    },
    Answer {
        sdp: SessionDescription,
        sender: UserId,
    },
    Candidate {
        candidate: CandidateInit,
    },
}

/// Control operations issued by the owner of the call.
#[derive(Debug)]
pub enum OrchestratorCommand {
    ToggleAudio,
    ToggleVideo,
    SwitchCamera,
    EndCall,
    Teardown,
    Shutdown,
}

/// Cheap handle for driving a running orchestrator.
#[derive(Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::Sender<OrchestratorCommand>,
}

impl OrchestratorHandle {
    pub async fn toggle_audio(&self) {
        self.send(OrchestratorCommand::ToggleAudio).await;
    }

    pub async fn toggle_video(&self) {
        self.send(OrchestratorCommand::ToggleVideo).await;
    }

    pub async fn switch_camera(&self) {
        self.send(OrchestratorCommand::SwitchCamera).await;
    }

    pub async fn end_call(&self) {
        self.send(OrchestratorCommand::EndCall).await;
    }

    /// Safe to call from any state, any number of times.
    pub async fn teardown(&self) {
        self.send(OrchestratorCommand::Teardown).await;
    }

    pub async fn shutdown(&self) {
        self.send(OrchestratorCommand::Shutdown).await;
    }

    async fn send(&self, command: OrchestratorCommand) {
        if self.commands.send(command).await.is_err() {
            debug!("Orchestrator is gone, command dropped");
        }
    }
}

/// Owns one peer-connection lifecycle per remote peer and drives the
/// offer/answer/candidate exchange. Runs as a single event loop, so no two
/// signaling events are ever processed concurrently against the same
/// state; asynchronous completions from torn-down attempts are recognized
/// by their generation tag and discarded.
pub struct Orchestrator {
    config: ClientConfig,
    signaling: Arc<dyn SignalingChannel>,
    factory: Arc<dyn PeerConnectionFactory>,
    observer: Arc<dyn CallObserver>,

    inputs: mpsc::Receiver<OrchestratorInput>,
    commands: mpsc::Receiver<OrchestratorCommand>,
    peer_events_tx: mpsc::Sender<PeerEvent>,
    peer_events: mpsc::Receiver<PeerEvent>,

    state: ConnectionState,
    role: SignalingRole,
    generation: u64,
    negotiation_in_progress: bool,
    local_connection_id: Option<ConnectionId>,
    remote_user_id: Option<UserId>,
    remote_connection_id: Option<ConnectionId>,
    session: Option<PeerSession>,
    buffer: CandidateBuffer,
    attempts: u32,
    retry_deadline: Option<Instant>,
}

impl Orchestrator {
    pub fn new(
        config: ClientConfig,
        signaling: Arc<dyn SignalingChannel>,
        factory: Arc<dyn PeerConnectionFactory>,
        observer: Arc<dyn CallObserver>,
    ) -> (Self, mpsc::Sender<OrchestratorInput>, OrchestratorHandle) {
        let (input_tx, input_rx) = mpsc::channel(64);
        let (command_tx, command_rx) = mpsc::channel(16);
        let (peer_events_tx, peer_events_rx) = mpsc::channel(64);

        let orchestrator = Self {
            config,
            signaling,
            factory,
            observer,
            inputs: input_rx,
            commands: command_rx,
            peer_events_tx,
            peer_events: peer_events_rx,
            state: ConnectionState::Idle,
            role: SignalingRole::Undetermined,
            generation: 0,
            negotiation_in_progress: false,
            local_connection_id: None,
            remote_user_id: None,
            remote_connection_id: None,
            session: None,
            buffer: CandidateBuffer::new(),
            attempts: 0,
            retry_deadline: None,
        };

        (orchestrator, input_tx, OrchestratorHandle {
            commands: command_tx,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub async fn run(mut self) {
        info!("Orchestrator event loop started");

        loop {
            tokio::select! {
                input = self.inputs.recv() => {
                    match input {
                        Some(input) => self.handle_input(input).await,
                        None => {
                            debug!("Input channel closed, shutting down orchestrator");
                            self.teardown().await;
                            break;
                        }
                    }
                }

                command = self.commands.recv() => {
                    match command {
                        Some(OrchestratorCommand::Shutdown) | None => {
                            self.teardown().await;
                            break;
                        }
                        Some(command) => self.handle_command(command).await,
                    }
                }

                Some(event) = self.peer_events.recv() => {
                    self.handle_peer_event(event).await;
                }

                _ = tokio::time::sleep_until(self.retry_deadline.unwrap_or_else(Instant::now)),
                    if self.retry_deadline.is_some() =>
                {
                    self.retry_deadline = None;
                    self.retry_connection().await;
                }
            }
        }

        info!("Orchestrator event loop finished");
    }

    async fn handle_input(&mut self, input: OrchestratorInput) {
        if self.state == ConnectionState::Closed {
            debug!("Orchestrator is closed, dropping inbound event");
            return;
        }

        match input {
            OrchestratorInput::Joined {
                connection_id,
                members,
            } => {
                self.local_connection_id = Some(connection_id);
                self.observer.on_room_update(members.clone()).await;
                self.evaluate_members(members).await;
            }
            OrchestratorInput::RoomUpdate { members } => {
                self.observer.on_room_update(members.clone()).await;
                self.evaluate_members(members).await;
            }
            OrchestratorInput::Offer {
                sdp,
                sender,
                sender_connection_id,
            } => {
                self.handle_offer(sdp, sender, sender_connection_id).await;
            }
            OrchestratorInput::Answer { sdp, sender } => {
                self.handle_answer(sdp, sender).await;
            }
            OrchestratorInput::Candidate { candidate } => {
                self.handle_candidate(candidate).await;
            }
        }
    }

    async fn handle_command(&mut self, command: OrchestratorCommand) {
        if self.state == ConnectionState::Closed
            && !matches!(command, OrchestratorCommand::Teardown)
        {
            debug!("Orchestrator is closed, dropping command");
            return;
        }

        match command {
            OrchestratorCommand::ToggleAudio => {
                if let Some(session) = &self.session {
                    let enabled = session.media.toggle_audio();
                    info!("Local audio enabled: {}", enabled);
                } else {
                    debug!("No local media to toggle");
                }
            }
            OrchestratorCommand::ToggleVideo => {
                if let Some(session) = &self.session {
                    let enabled = session.media.toggle_video();
                    info!("Local video enabled: {}", enabled);
                } else {
                    debug!("No local media to toggle");
                }
            }
            OrchestratorCommand::SwitchCamera => {
                if let Some(session) = &self.session {
                    if let Err(e) = session.media.switch_camera() {
                        debug!("Camera switch unavailable: {}", e);
                    }
                } else {
                    debug!("No local media to switch");
                }
            }
            OrchestratorCommand::EndCall => {
                let event = ClientEvent::EndCall {
                    room_id: self.config.room_id.clone(),
                    sender: self.config.user_id.clone(),
                };
                if let Err(e) = self.signaling.send(event).await {
                    warn!("Failed to announce end of call: {}", e);
                }
                self.reset_to_waiting().await;
            }
            OrchestratorCommand::Teardown => self.teardown().await,
            // handled in the loop
            OrchestratorCommand::Shutdown => {}
        }
    }

    /// Caller-side trigger: the first time exactly one other member is
    /// visible and no attempt is running, record it as the remote peer and
    /// start negotiating. A shrink back to just us tears the call down and
    /// re-enters the waiting state, even from `connected`.
    async fn evaluate_members(&mut self, members: Vec<MemberInfo>) {
        let others: Vec<&MemberInfo> = members
            .iter()
            .filter(|m| Some(m.connection_id) != self.local_connection_id)
            .collect();

        if others.is_empty() {
            if self.session.is_some() || self.remote_connection_id.is_some() {
                info!("Remote peer left, waiting for a new one");
                self.reset_to_waiting().await;
            }
            return;
        }

        if others.len() > 1 {
            debug!("{} other members present, two-party calls only", others.len());
            return;
        }

        if self.session.is_none() && !self.negotiation_in_progress {
            let other = others[0];
            info!("Starting connection with {}", other.user_id);
            self.remote_user_id = Some(other.user_id.clone());
            self.remote_connection_id = Some(other.connection_id);
            self.start_as_caller().await;
        }
    }

    async fn start_as_caller(&mut self) {
        if self.negotiation_in_progress {
            debug!("Connection attempt already in progress");
            return;
        }

        self.negotiation_in_progress = true;
        self.role = SignalingRole::Caller;
        self.set_state(ConnectionState::Connecting).await;

        if let Err(e) = self.run_caller_negotiation().await {
            warn!("Caller negotiation failed: {}", e);
            self.handle_negotiation_failure().await;
        }
    }

    async fn run_caller_negotiation(&mut self) -> Result<(), SignalError> {
        let connection = self.create_session().await?;

        let offer = connection.create_offer().await?;
        connection.set_local_description(offer.clone()).await?;
        if let Some(session) = self.session.as_mut() {
            session.local_description_set = true;
        }

        // no target: the relay broadcasts to the rest of the room
        self.signaling
            .send(ClientEvent::Offer {
                room_id: self.config.room_id.clone(),
                sdp: offer,
                sender: self.config.user_id.clone(),
                target: None,
            })
            .await?;
        info!("Offer sent");
        Ok(())
    }

    /// Answerer path. The most recently arrived offer wins: an in-flight
    /// attempt is discarded and rebuilt against the new description. The
    /// glare exception: while our own offer is outstanding, the
    /// lexicographically smaller user id stays caller and drops the
    /// colliding offer.
    async fn handle_offer(
        &mut self,
        sdp: SessionDescription,
        sender: UserId,
        sender_connection_id: ConnectionId,
    ) {
        let local_offer_outstanding = self.role == SignalingRole::Caller
            && self
                .session
                .as_ref()
                .is_some_and(|s| s.local_description_set && !s.remote_description_set);
        if local_offer_outstanding && self.config.user_id < sender {
            info!("Glare: staying caller, dropping offer from {}", sender);
            return;
        }

        info!("Received offer from {}", sender);
        self.remote_user_id = Some(sender);
        self.remote_connection_id = Some(sender_connection_id);
        self.role = SignalingRole::Answerer;

        if self.session.is_some() {
            debug!("Replacing in-flight attempt with the newly arrived offer");
            self.destroy_session().await;
        }

        self.negotiation_in_progress = true;
        self.set_state(ConnectionState::Connecting).await;

        if let Err(e) = self.run_answerer_negotiation(sdp).await {
            warn!("Answerer negotiation failed: {}", e);
            self.handle_negotiation_failure().await;
        }
    }

    async fn run_answerer_negotiation(
        &mut self,
        remote: SessionDescription,
    ) -> Result<(), SignalError> {
        let connection = self.create_session().await?;

        self.apply_remote_description(&connection, remote).await?;

        let answer = connection.create_answer().await?;
        connection.set_local_description(answer.clone()).await?;
        if let Some(session) = self.session.as_mut() {
            session.local_description_set = true;
        }

        // addressed to the offer's sender, not broadcast
        self.signaling
            .send(ClientEvent::Answer {
                room_id: self.config.room_id.clone(),
                sdp: answer,
                sender: self.config.user_id.clone(),
                target: self.remote_connection_id,
            })
            .await?;
        info!("Answer sent");
        Ok(())
    }

    async fn handle_answer(&mut self, sdp: SessionDescription, sender: UserId) {
        let Some(session) = &self.session else {
            info!("No peer connection for answer from {}, ignoring", sender);
            return;
        };
        if self.role != SignalingRole::Caller || !session.local_description_set {
            warn!("Answer without a pending offer, ignoring");
            return;
        }
        if session.remote_description_set {
            debug!("Duplicate answer, ignoring");
            return;
        }

        let connection = session.connection.clone();
        match self.apply_remote_description(&connection, sdp).await {
            Ok(()) => info!("Answer applied"),
            Err(e) => {
                warn!("Failed to apply answer: {}", e);
                self.handle_negotiation_failure().await;
            }
        }
    }

    /// Candidates are applied immediately once a remote description is in
    /// place; before that they are buffered in arrival order.
    async fn handle_candidate(&mut self, candidate: CandidateInit) {
        if self.buffer.is_open() {
            if let Some(session) = &self.session {
                if let Err(e) = session.connection.add_ice_candidate(candidate).await {
                    warn!("Failed to add ICE candidate: {}", e);
                }
            }
        } else {
            debug!("Buffering ICE candidate until a remote description is set");
            self.buffer.push(candidate);
        }
    }

    async fn handle_peer_event(&mut self, event: PeerEvent) {
        if self.session.as_ref().map(|s| s.generation) != Some(event.generation) {
            debug!(
                "Discarding completion from stale negotiation {}",
                event.generation
            );
            return;
        }

        match event.kind {
            PeerEventKind::StateChanged(state) => self.handle_transport_state(state).await,
            PeerEventKind::CandidateGenerated(candidate) => {
                let event = ClientEvent::IceCandidate {
                    room_id: self.config.room_id.clone(),
                    candidate,
                    sender: self.config.user_id.clone(),
                    target: None,
                };
                if let Err(e) = self.signaling.send(event).await {
                    warn!("Failed to relay local candidate: {}", e);
                }
            }
            PeerEventKind::RemoteStreamAdded(stream) => {
                self.observer.on_remote_stream(stream).await;
            }
        }
    }

    async fn handle_transport_state(&mut self, state: PeerConnectionState) {
        match state {
            PeerConnectionState::Connected => {
                self.negotiation_in_progress = false;
                self.attempts = 0;
                self.set_state(ConnectionState::Connected).await;
            }
            PeerConnectionState::Failed => {
                self.set_state(ConnectionState::Failed).await;
                self.handle_negotiation_failure().await;
            }
            PeerConnectionState::Disconnected => {
                self.negotiation_in_progress = false;
                self.set_state(ConnectionState::Disconnected).await;
            }
            PeerConnectionState::New
            | PeerConnectionState::Connecting
            | PeerConnectionState::Closed => {}
        }
    }

    /// Failure handling: never patch the broken connection; tear it down
    /// and, within the retry budget, schedule a from-scratch renegotiation.
    async fn handle_negotiation_failure(&mut self) {
        self.destroy_session().await;

        let next_attempt = self.attempts + 1;
        if self.remote_connection_id.is_some() && self.config.retry.allows(next_attempt) {
            self.attempts = next_attempt;
            let delay = self.config.retry.backoff(next_attempt);
            info!(
                "Scheduling reconnect attempt {}/{} in {:?}",
                next_attempt, self.config.retry.max_attempts, delay
            );
            self.observer.on_reconnecting(next_attempt).await;
            self.retry_deadline = Some(Instant::now() + delay);
        } else {
            warn!("Not reconnecting (out of attempts or no remote peer)");
            self.set_state(ConnectionState::Failed).await;
        }
    }

    async fn retry_connection(&mut self) {
        if self.session.is_some() {
            // an inbound offer restarted negotiation while we waited
            debug!("Negotiation already restarted, skipping retry");
            return;
        }
        if self.remote_connection_id.is_none() {
            debug!("Remote peer is gone, skipping retry");
            return;
        }

        info!("Re-running negotiation from scratch");
        self.start_as_caller().await;
    }

    async fn create_session(&mut self) -> Result<Arc<dyn PeerConnectionHandle>, SignalError> {
        self.generation += 1;
        let parts = self
            .factory
            .create(self.generation, self.peer_events_tx.clone())
            .await?;

        let connection = parts.connection.clone();
        self.observer.on_local_stream(parts.media.clone()).await;
        self.session = Some(PeerSession {
            generation: self.generation,
            connection: parts.connection,
            media: parts.media,
            local_description_set: false,
            remote_description_set: false,
        });
        Ok(connection)
    }

    /// Applies the description and drains the candidate buffer against it,
    /// preserving arrival order.
    async fn apply_remote_description(
        &mut self,
        connection: &Arc<dyn PeerConnectionHandle>,
        desc: SessionDescription,
    ) -> Result<(), SignalError> {
        connection.set_remote_description(desc).await?;
        if let Some(session) = self.session.as_mut() {
            session.remote_description_set = true;
        }

        let pending = self.buffer.open();
        if !pending.is_empty() {
            info!("Applying {} buffered ICE candidate(s)", pending.len());
        }
        for candidate in pending {
            if let Err(e) = connection.add_ice_candidate(candidate).await {
                warn!("Failed to apply buffered candidate: {}", e);
            }
        }
        Ok(())
    }

    /// Closes the current attempt and resets everything tied to the
    /// peer-connection instance, including the candidate buffer.
    async fn destroy_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.media.stop();
            session.connection.close().await;
        }
        self.buffer = CandidateBuffer::new();
        self.negotiation_in_progress = false;
    }

    /// Back to waiting-for-remote: clears the remote identity and the
    /// retry schedule on top of the session teardown.
    async fn reset_to_waiting(&mut self) {
        self.destroy_session().await;
        self.remote_user_id = None;
        self.remote_connection_id = None;
        self.role = SignalingRole::Undetermined;
        self.attempts = 0;
        self.retry_deadline = None;
        self.set_state(ConnectionState::Idle).await;
    }

    /// Full teardown into the terminal state. Safe from any state and
    /// idempotent.
    async fn teardown(&mut self) {
        self.destroy_session().await;
        self.remote_user_id = None;
        self.remote_connection_id = None;
        self.role = SignalingRole::Undetermined;
        self.attempts = 0;
        self.retry_deadline = None;
        self.set_state(ConnectionState::Closed).await;
    }

    /// Single point for state transitions: at most one observer
    /// notification per change.
    async fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        info!("Connection state: {:?} -> {:?}", self.state, state);
        self.state = state;
        self.observer.on_connection_state(state).await;
    }
}
