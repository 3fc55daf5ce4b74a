use crate::utils::start_orchestrator;
use crate::{settle, wait_until};
use flare_client::{ConnectionState, PeerConnectionState};
use flare_core::ConnectionId;

#[tokio::test]
async fn test_failure_triggers_a_from_scratch_retry() {
    let harness = start_orchestrator("alice").await;
    let bob_conn = ConnectionId::new();

    harness.join_alone().await;
    harness.room_update_with(bob_conn, "bob").await;
    assert!(wait_until(|| harness.signaling.offers().len() == 1).await);

    harness.factory.emit_state(PeerConnectionState::Failed).await;

    // the reconnect is surfaced, then a whole new negotiation runs
    assert!(wait_until(|| harness.observer.reconnect_attempts() == vec![1]).await);
    assert!(wait_until(|| harness.signaling.offers().len() == 2).await);
    assert_eq!(harness.factory.created_count(), 2);
    assert!(harness.factory.connection(0).is_closed());
    assert!(!harness.factory.connection(1).is_closed());
}

#[tokio::test]
async fn test_success_resets_the_attempt_budget() {
    let harness = start_orchestrator("alice").await;
    let bob_conn = ConnectionId::new();

    harness.join_alone().await;
    harness.room_update_with(bob_conn, "bob").await;
    assert!(wait_until(|| harness.signaling.offers().len() == 1).await);

    harness.factory.emit_state(PeerConnectionState::Failed).await;
    assert!(wait_until(|| harness.signaling.offers().len() == 2).await);

    harness.factory.emit_state(PeerConnectionState::Connected).await;
    assert!(wait_until(|| {
        harness.observer.last_state() == Some(ConnectionState::Connected)
    })
    .await);

    // the next failure starts counting from one again
    harness.factory.emit_state(PeerConnectionState::Failed).await;
    assert!(wait_until(|| harness.observer.reconnect_attempts() == vec![1, 1]).await);
}

#[tokio::test]
async fn test_retries_stop_at_the_budget() {
    let harness = start_orchestrator("alice").await;
    let bob_conn = ConnectionId::new();

    harness.join_alone().await;
    harness.room_update_with(bob_conn, "bob").await;

    // fail every attempt as soon as its offer appears
    for round in 1..=4 {
        assert!(
            wait_until(|| harness.signaling.offers().len() == round).await,
            "attempt {round} never produced an offer"
        );
        harness.factory.emit_state(PeerConnectionState::Failed).await;
        settle().await;
    }

    // three retries were allowed on top of the initial attempt
    settle().await;
    assert_eq!(harness.signaling.offers().len(), 4);
    assert_eq!(harness.observer.reconnect_attempts(), vec![1, 2, 3]);
    assert_eq!(harness.observer.last_state(), Some(ConnectionState::Failed));
}
