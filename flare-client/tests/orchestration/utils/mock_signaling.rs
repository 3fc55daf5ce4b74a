use async_trait::async_trait;
use flare_client::SignalingChannel;
use flare_core::{ClientEvent, ConnectionId, SessionDescription, SignalError};
use std::sync::Mutex;

/// Signaling transport that records everything instead of sending it.
#[derive(Default)]
pub struct MockSignaling {
    sent: Mutex<Vec<ClientEvent>>,
}

impl MockSignaling {
    pub fn sent_events(&self) -> Vec<ClientEvent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn offers(&self) -> Vec<(SessionDescription, Option<ConnectionId>)> {
        self.sent_events()
            .into_iter()
            .filter_map(|e| match e {
                ClientEvent::Offer { sdp, target, .. } => Some((sdp, target)),
                _ => None,
            })
            .collect()
    }

    pub fn answers(&self) -> Vec<(SessionDescription, Option<ConnectionId>)> {
        self.sent_events()
            .into_iter()
            .filter_map(|e| match e {
                ClientEvent::Answer { sdp, target, .. } => Some((sdp, target)),
                _ => None,
            })
            .collect()
    }

    pub fn candidates(&self) -> Vec<String> {
        self.sent_events()
            .into_iter()
            .filter_map(|e| match e {
                ClientEvent::IceCandidate { candidate, .. } => Some(candidate.candidate),
                _ => None,
            })
            .collect()
    }

    pub fn end_calls(&self) -> usize {
        self.sent_events()
            .iter()
            .filter(|e| matches!(e, ClientEvent::EndCall { .. }))
            .count()
    }
}

#[async_trait]
impl SignalingChannel for MockSignaling {
    async fn send(&self, event: ClientEvent) -> Result<(), SignalError> {
        self.sent.lock().unwrap().push(event);
        Ok(())
    }
}
