use crate::init_tracing;
use anyhow::{Context, Result};
use flare_core::{ClientEvent, ServerEvent, SessionDescription};
use flare_server::{RelayConfig, RelayService, router};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

const WS_TIMEOUT_MS: u64 = 3000;

async fn start_server() -> SocketAddr {
    let relay = RelayService::new(RelayConfig::default());
    let app = router(relay);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("no local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server crashed");
    });

    addr
}

struct WsClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    async fn connect(addr: SocketAddr) -> Result<Self> {
        let (socket, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .context("WebSocket connect failed")?;
        Ok(Self { socket })
    }

    async fn send(&mut self, event: &ClientEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        self.socket.send(Message::text(json)).await?;
        Ok(())
    }

    async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.socket.send(Message::text(text.to_owned())).await?;
        Ok(())
    }

    /// Next text frame parsed as a server event; skips control frames.
    async fn recv(&mut self) -> Result<ServerEvent> {
        loop {
            let msg = tokio::time::timeout(
                Duration::from_millis(WS_TIMEOUT_MS),
                self.socket.next(),
            )
            .await
            .context("timed out waiting for server event")?
            .context("socket closed")??;

            if let Message::Text(text) = msg {
                return serde_json::from_str(&text).context("unparseable server event");
            }
        }
    }
}

#[tokio::test]
async fn test_join_and_offer_over_a_real_socket() -> Result<()> {
    init_tracing();
    let addr = start_server().await;

    let mut alice = WsClient::connect(addr).await?;
    alice
        .send(&ClientEvent::Join {
            room_id: "r1".into(),
            user_id: "alice".into(),
        })
        .await?;

    let (alice_conn, clients) = match alice.recv().await? {
        ServerEvent::Joined {
            connection_id,
            clients,
            ..
        } => (connection_id, clients),
        other => panic!("expected joined, got {other:?}"),
    };
    assert_eq!(clients.len(), 1);

    let mut bob = WsClient::connect(addr).await?;
    bob.send(&ClientEvent::Join {
        room_id: "r1".into(),
        user_id: "bob".into(),
    })
    .await?;

    let bob_conn = match bob.recv().await? {
        ServerEvent::Joined { connection_id, .. } => connection_id,
        other => panic!("expected joined, got {other:?}"),
    };

    match alice.recv().await? {
        ServerEvent::RoomUpdate { clients, .. } => assert_eq!(clients.len(), 2),
        other => panic!("expected room:update, got {other:?}"),
    }

    // broadcast offer reaches bob with the sender's connection id attached
    alice
        .send(&ClientEvent::Offer {
            room_id: "r1".into(),
            sdp: SessionDescription::offer("v=0 offer"),
            sender: "alice".into(),
            target: None,
        })
        .await?;

    match bob.recv().await? {
        ServerEvent::Offer {
            sender_connection_id,
            sdp,
            ..
        } => {
            assert_eq!(sender_connection_id, alice_conn);
            assert_eq!(sdp.sdp, "v=0 offer");
        }
        other => panic!("expected offer, got {other:?}"),
    }

    // targeted answer comes back to alice only
    bob.send(&ClientEvent::Answer {
        room_id: "r1".into(),
        sdp: SessionDescription::answer("v=0 answer"),
        sender: "bob".into(),
        target: Some(alice_conn),
    })
    .await?;

    match alice.recv().await? {
        ServerEvent::Answer {
            sender_connection_id,
            ..
        } => assert_eq!(sender_connection_id, bob_conn),
        other => panic!("expected answer, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_malformed_frame_gets_error_and_connection_survives() -> Result<()> {
    init_tracing();
    let addr = start_server().await;

    let mut alice = WsClient::connect(addr).await?;
    alice.send_raw("{not json").await?;

    match alice.recv().await? {
        ServerEvent::Error { message } => assert!(message.contains("invalid event")),
        other => panic!("expected error, got {other:?}"),
    }

    alice.send(&ClientEvent::Ping).await?;
    assert!(matches!(alice.recv().await?, ServerEvent::Pong { .. }));
    Ok(())
}

#[tokio::test]
async fn test_socket_drop_acts_as_disconnect() -> Result<()> {
    init_tracing();
    let addr = start_server().await;

    let mut alice = WsClient::connect(addr).await?;
    alice
        .send(&ClientEvent::Join {
            room_id: "r1".into(),
            user_id: "alice".into(),
        })
        .await?;
    alice.recv().await?;

    let mut bob = WsClient::connect(addr).await?;
    bob.send(&ClientEvent::Join {
        room_id: "r1".into(),
        user_id: "bob".into(),
    })
    .await?;
    bob.recv().await?;
    alice.recv().await?; // room:update with both

    drop(bob);

    match alice.recv().await? {
        ServerEvent::RoomUpdate { clients, .. } => assert_eq!(clients.len(), 1),
        other => panic!("expected room:update, got {other:?}"),
    }
    match alice.recv().await? {
        ServerEvent::UserDisconnected { user_id, .. } => assert_eq!(user_id, "bob".into()),
        other => panic!("expected user-disconnected, got {other:?}"),
    }
    Ok(())
}
