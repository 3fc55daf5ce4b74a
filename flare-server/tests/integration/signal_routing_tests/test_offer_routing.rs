use crate::utils::TestConnection;
use crate::{create_test_relay, init_tracing};
use flare_core::ServerEvent;

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
async fn test_offer_without_target_reaches_only_the_other_member() {
    init_tracing();
    let relay = create_test_relay();
    let (mut alice, mut bob) = joined_pair(&relay).await;

    alice.send_offer("r1", "v=0 offer", None);

    match bob.recv().await {
        ServerEvent::Offer {
            room_id,
            sdp,
            sender,
            sender_connection_id,
        } => {
            assert_eq!(room_id, "r1".into());
            assert_eq!(sdp.sdp, "v=0 offer");
            assert_eq!(sender, "alice".into());
            assert_eq!(sender_connection_id, alice.connection_id);
        }
        other => panic!("expected offer, got {other:?}"),
    }
    // no echo back to the sender
    assert!(alice.try_recv().is_none());
}

#[tokio::test]
async fn test_targeted_answer_skips_other_members() {
    init_tracing();
    let relay = create_test_relay();
    let (mut alice, mut bob) = joined_pair(&relay).await;

    let mut carol = TestConnection::connect(&relay, "carol");
    carol.join("r1");
    carol.expect_joined().await;
    alice.expect_room_update().await;
    bob.expect_room_update().await;

    bob.send_answer("r1", "v=0 answer", Some(alice.connection_id));

    match alice.recv().await {
        ServerEvent::Answer {
            sender,
            sender_connection_id,
            ..
        } => {
            assert_eq!(sender, "bob".into());
            assert_eq!(sender_connection_id, bob.connection_id);
        }
        other => panic!("expected answer, got {other:?}"),
    }
    assert!(carol.try_recv().is_none());
    assert!(bob.try_recv().is_none());
}

#[tokio::test]
async fn test_candidate_target_routing() {
    init_tracing();
    let relay = create_test_relay();
    let (mut alice, mut bob) = joined_pair(&relay).await;

    alice.send_candidate("r1", "candidate:0 1 udp 1 10.0.0.1 5000 typ host", Some(bob.connection_id));

    match bob.recv().await {
        ServerEvent::IceCandidate { candidate, .. } => {
            assert!(candidate.candidate.starts_with("candidate:0"));
        }
        other => panic!("expected ice-candidate, got {other:?}"),
    }
    assert!(alice.try_recv().is_none());
}

#[tokio::test]
async fn test_signal_to_unknown_room_is_dropped_silently() {
    init_tracing();
    let relay = create_test_relay();
    let (mut alice, mut bob) = joined_pair(&relay).await;

    alice.send_offer("nowhere", "v=0 offer", None);

    // a state error: no error event, nothing delivered
    assert!(alice.try_recv().is_none());
    assert!(bob.try_recv().is_none());
}
