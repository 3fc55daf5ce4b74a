use crate::utils::start_orchestrator;
use crate::wait_until;
use flare_client::{ConnectionState, PeerConnectionState};
use flare_core::ConnectionId;

#[tokio::test]
async fn test_remote_leave_mid_call_resets_to_waiting() {
    let harness = start_orchestrator("alice").await;
    let bob_conn = ConnectionId::new();

    harness.join_alone().await;
    harness.room_update_with(bob_conn, "bob").await;
    assert!(wait_until(|| harness.signaling.offers().len() == 1).await);
    harness.factory.emit_state(PeerConnectionState::Connected).await;
    assert!(wait_until(|| {
        harness.observer.last_state() == Some(ConnectionState::Connected)
    })
    .await);

    // bob drops off; even an established call is torn down
    harness.room_update_alone().await;

    assert!(wait_until(|| {
        harness.observer.last_state() == Some(ConnectionState::Idle)
    })
    .await);
    assert!(harness.factory.connection(0).is_closed());
}

#[tokio::test]
async fn test_waiting_peer_reengages_with_the_next_arrival() {
    let harness = start_orchestrator("alice").await;
    let bob_conn = ConnectionId::new();

    harness.join_alone().await;
    harness.room_update_with(bob_conn, "bob").await;
    assert!(wait_until(|| harness.signaling.offers().len() == 1).await);

    harness.room_update_alone().await;
    assert!(wait_until(|| {
        harness.observer.last_state() == Some(ConnectionState::Idle)
    })
    .await);

    // a different peer shows up later; a brand-new negotiation starts
    let carol_conn = ConnectionId::new();
    harness.room_update_with(carol_conn, "carol").await;

    assert!(wait_until(|| harness.signaling.offers().len() == 2).await);
    assert_eq!(harness.factory.created_count(), 2);
}
