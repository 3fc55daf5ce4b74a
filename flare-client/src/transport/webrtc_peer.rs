use crate::transport::{
    LocalMedia, MediaKind, PeerConnectionFactory, PeerConnectionHandle, PeerConnectionState,
    PeerEvent, PeerEventKind, PeerParts, RemoteStream,
};
use async_trait::async_trait;
use flare_core::{CandidateInit, IceServerConfig, SdpKind, SessionDescription, SignalError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// Builds `webrtc`-crate peer connections with a local audio and video
/// track attached, and forwards connection-state changes, trickle
/// candidates and remote tracks into the orchestrator's event channel.
pub struct WebrtcPeerFactory {
    ice_servers: Vec<IceServerConfig>,
}

impl WebrtcPeerFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }
}

#[async_trait]
impl PeerConnectionFactory for WebrtcPeerFactory {
    async fn create(
        &self,
        generation: u64,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<PeerParts, SignalError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(negotiation)?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(negotiation)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = self
            .ice_servers
            .iter()
            .map(|s| RTCIceServer {
                urls: s.urls.clone(),
                username: s.username.clone().unwrap_or_default(),
                credential: s.credential.clone().unwrap_or_default(),
            })
            .collect();

        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let pc = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(negotiation)?,
        );

        let state_tx = events.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            Box::pin(async move {
                let _ = tx
                    .send(PeerEvent {
                        generation,
                        kind: PeerEventKind::StateChanged(map_state(s)),
                    })
                    .await;
            })
        }));

        let ice_tx = events.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(json) = candidate.to_json() else {
                    return;
                };
                let init = CandidateInit {
                    candidate: json.candidate,
                    sdp_mid: json.sdp_mid,
                    sdp_m_line_index: json.sdp_mline_index,
                };
                let _ = tx
                    .send(PeerEvent {
                        generation,
                        kind: PeerEventKind::CandidateGenerated(init),
                    })
                    .await;
            })
        }));

        let track_tx = events.clone();
        pc.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
            let tx = track_tx.clone();
            Box::pin(async move {
                debug!("Remote track added: {} ({})", track.id(), track.kind());
                let kind = match track.kind() {
                    RTPCodecType::Audio => MediaKind::Audio,
                    _ => MediaKind::Video,
                };
                let stream = RemoteStream {
                    stream_id: track.stream_id(),
                    track_id: track.id(),
                    kind,
                };
                let _ = tx
                    .send(PeerEvent {
                        generation,
                        kind: PeerEventKind::RemoteStreamAdded(stream),
                    })
                    .await;
            })
        }));

        let media = WebrtcLocalMedia::create(&pc).await?;

        Ok(PeerParts {
            connection: Arc::new(WebrtcPeerConnection { pc }),
            media: Arc::new(media),
        })
    }
}

struct WebrtcPeerConnection {
    pc: Arc<RTCPeerConnection>,
}

#[async_trait]
impl PeerConnectionHandle for WebrtcPeerConnection {
    async fn create_offer(&self) -> Result<SessionDescription, SignalError> {
        let offer = self.pc.create_offer(None).await.map_err(negotiation)?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, SignalError> {
        let answer = self.pc.create_answer(None).await.map_err(negotiation)?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), SignalError> {
        let desc = to_rtc_description(desc)?;
        self.pc
            .set_local_description(desc)
            .await
            .map_err(negotiation)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), SignalError> {
        let desc = to_rtc_description(desc)?;
        self.pc
            .set_remote_description(desc)
            .await
            .map_err(negotiation)
    }

    async fn add_ice_candidate(&self, candidate: CandidateInit) -> Result<(), SignalError> {
        let init = webrtc::ice_transport::ice_candidate::RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.pc.add_ice_candidate(init).await.map_err(negotiation)
    }

    async fn close(&self) {
        if let Err(e) = self.pc.close().await {
            debug!("Error closing peer connection: {}", e);
        }
    }
}

/// Local capture pair backed by static sample tracks. The enabled flags
/// gate the capture pipeline; flipping them never triggers renegotiation.
struct WebrtcLocalMedia {
    _audio: Arc<TrackLocalStaticSample>,
    _video: Arc<TrackLocalStaticSample>,
    audio_enabled: AtomicBool,
    video_enabled: AtomicBool,
}

impl WebrtcLocalMedia {
    async fn create(pc: &Arc<RTCPeerConnection>) -> Result<Self, SignalError> {
        let audio = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                ..Default::default()
            },
            "audio".to_owned(),
            "flare-local".to_owned(),
        ));
        let video = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "video".to_owned(),
            "flare-local".to_owned(),
        ));

        pc.add_track(Arc::clone(&audio) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(negotiation)?;
        pc.add_track(Arc::clone(&video) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(negotiation)?;

        Ok(Self {
            _audio: audio,
            _video: video,
            audio_enabled: AtomicBool::new(true),
            video_enabled: AtomicBool::new(true),
        })
    }
}

impl LocalMedia for WebrtcLocalMedia {
    fn audio_enabled(&self) -> bool {
        self.audio_enabled.load(Ordering::Relaxed)
    }

    fn video_enabled(&self) -> bool {
        self.video_enabled.load(Ordering::Relaxed)
    }

    fn set_audio_enabled(&self, enabled: bool) {
        self.audio_enabled.store(enabled, Ordering::Relaxed);
    }

    fn set_video_enabled(&self, enabled: bool) {
        self.video_enabled.store(enabled, Ordering::Relaxed);
    }

    fn switch_camera(&self) -> Result<(), SignalError> {
        Err(SignalError::state(
            "facing-mode swap is not available for sample tracks",
        ))
    }

    fn stop(&self) {
        self.audio_enabled.store(false, Ordering::Relaxed);
        self.video_enabled.store(false, Ordering::Relaxed);
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription, SignalError> {
    match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp).map_err(negotiation),
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp).map_err(negotiation),
    }
}

fn map_state(state: RTCPeerConnectionState) -> PeerConnectionState {
    match state {
        RTCPeerConnectionState::New | RTCPeerConnectionState::Unspecified => {
            PeerConnectionState::New
        }
        RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
        RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
        RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
    }
}

fn negotiation(e: impl std::fmt::Display) -> SignalError {
    SignalError::negotiation(e.to_string())
}
