use crate::utils::TestConnection;
use crate::{create_test_relay, init_tracing};
use flare_core::{ClientEvent, ServerEvent, now_millis};

async fn joined_pair(
    relay: &flare_server::RelayService,
) -> (TestConnection, TestConnection) {
    let mut alice = TestConnection::connect(relay, "alice");
    let mut bob = TestConnection::connect(relay, "bob");
    alice.join("r1");
    alice.expect_joined().await;
    bob.join("r1");
    bob.expect_joined().await;
    alice.expect_room_update().await;
    (alice, bob)
}

#[tokio::test]
async fn test_chat_is_relay_stamped_and_not_echoed() {
    init_tracing();
    let relay = create_test_relay();
    let (mut alice, mut bob) = joined_pair(&relay).await;

    let before = now_millis();
    alice.send_event(ClientEvent::ChatMessage {
        room_id: "r1".into(),
        message: "hello".into(),
        sender: alice.user_id.clone(),
    });

    match bob.recv().await {
        ServerEvent::ChatMessage(chat) => {
            assert_eq!(chat.message, "hello");
            assert_eq!(chat.sender, "alice".into());
            assert_eq!(chat.sender_connection_id, alice.connection_id);
            assert!(chat.timestamp >= before);
        }
        other => panic!("expected chat-message, got {other:?}"),
    }
    assert!(alice.try_recv().is_none());
}

#[tokio::test]
async fn test_call_user_rings_only_the_target() {
    init_tracing();
    let relay = create_test_relay();
    let (mut alice, mut bob) = joined_pair(&relay).await;

    alice.send_event(ClientEvent::CallUser {
        room_id: "r1".into(),
        target: bob.connection_id,
        sender: alice.user_id.clone(),
    });

    match bob.recv().await {
        ServerEvent::IncomingCall {
            caller,
            caller_connection_id,
            room_id,
        } => {
            assert_eq!(caller, "alice".into());
            assert_eq!(caller_connection_id, alice.connection_id);
            assert_eq!(room_id, "r1".into());
        }
        other => panic!("expected incoming-call, got {other:?}"),
    }
    assert!(alice.try_recv().is_none());
}

#[tokio::test]
async fn test_call_accept_and_reject_are_targeted() {
    init_tracing();
    let relay = create_test_relay();
    let (mut alice, mut bob) = joined_pair(&relay).await;

    bob.send_event(ClientEvent::CallAccepted {
        room_id: "r1".into(),
        target: alice.connection_id,
        sender: bob.user_id.clone(),
    });
    assert!(matches!(
        alice.recv().await,
        ServerEvent::CallAccepted { .. }
    ));

    bob.send_event(ClientEvent::CallRejected {
        room_id: "r1".into(),
        target: alice.connection_id,
        sender: bob.user_id.clone(),
    });
    assert!(matches!(
        alice.recv().await,
        ServerEvent::CallRejected { .. }
    ));
    assert!(bob.try_recv().is_none());
}

#[tokio::test]
async fn test_end_call_is_broadcast_to_the_room() {
    init_tracing();
    let relay = create_test_relay();
    let (mut alice, mut bob) = joined_pair(&relay).await;

    alice.send_event(ClientEvent::EndCall {
        room_id: "r1".into(),
        sender: alice.user_id.clone(),
    });

    match bob.recv().await {
        ServerEvent::CallEnded { ender, .. } => assert_eq!(ender, "alice".into()),
        other => panic!("expected call-ended, got {other:?}"),
    }
    assert!(alice.try_recv().is_none());
}

#[tokio::test]
async fn test_ping_pong() {
    init_tracing();
    let relay = create_test_relay();

    let mut alice = TestConnection::connect(&relay, "alice");
    alice.send_event(ClientEvent::Ping);

    match alice.recv().await {
        ServerEvent::Pong { timestamp } => assert!(timestamp > 0),
        other => panic!("expected pong, got {other:?}"),
    }
}
