use crate::signaling::SignalingChannel;
use async_trait::async_trait;
use flare_core::{ClientEvent, ServerEvent, SignalError};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// WebSocket signaling transport. `connect` performs the handshake under a
/// bounded timeout and returns the send handle plus the inbound event
/// stream; reader and writer run as background tasks for the life of the
/// socket.
pub struct WsSignaling {
    outbound: mpsc::UnboundedSender<Message>,
}

impl WsSignaling {
    pub async fn connect(
        url: &str,
        timeout: Duration,
    ) -> Result<(Arc<Self>, mpsc::Receiver<ServerEvent>), SignalError> {
        let (socket, _) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| {
                SignalError::transport(format!("signaling handshake timed out after {timeout:?}"))
            })?
            .map_err(|e| SignalError::transport(e.to_string()))?;

        let (mut sink, mut stream) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::channel(64);

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if in_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping malformed server event: {}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            debug!("Signaling socket closed");
        });

        Ok((Arc::new(Self { outbound: out_tx }), in_rx))
    }
}

#[async_trait]
impl SignalingChannel for WsSignaling {
    async fn send(&self, event: ClientEvent) -> Result<(), SignalError> {
        let json =
            serde_json::to_string(&event).map_err(|e| SignalError::transport(e.to_string()))?;
        self.outbound
            .send(Message::text(json))
            .map_err(|_| SignalError::transport("signaling connection is closed"))
    }
}
