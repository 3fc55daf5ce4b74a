use crate::utils::TestConnection;
use crate::{create_test_relay, init_tracing};
use flare_core::ServerEvent;

#[tokio::test]
async fn test_first_join_reports_only_self() {
    init_tracing();
    let relay = create_test_relay();

    let mut alice = TestConnection::connect(&relay, "alice");
    alice.join("r1");

    let (room_id, connection_id, clients) = alice.expect_joined().await;
    assert_eq!(room_id, "r1".into());
    assert_eq!(connection_id, alice.connection_id);
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].connection_id, alice.connection_id);
}

#[tokio::test]
async fn test_second_join_updates_the_room() {
    init_tracing();
    let relay = create_test_relay();

    let mut alice = TestConnection::connect(&relay, "alice");
    let mut bob = TestConnection::connect(&relay, "bob");

    alice.join("r1");
    alice.expect_joined().await;

    bob.join("r1");
    let (_, _, clients) = bob.expect_joined().await;
    assert_eq!(clients.len(), 2);

    let (room_id, clients) = alice.expect_room_update().await;
    assert_eq!(room_id, "r1".into());
    let ids: Vec<_> = clients.iter().map(|m| m.connection_id).collect();
    assert!(ids.contains(&alice.connection_id));
    assert!(ids.contains(&bob.connection_id));
}

#[tokio::test]
async fn test_rejoining_never_duplicates_a_member() {
    init_tracing();
    let relay = create_test_relay();

    let mut alice = TestConnection::connect(&relay, "alice");
    alice.join("r1");
    alice.expect_joined().await;
    alice.join("r1");

    let (_, _, clients) = alice.expect_joined().await;
    let matching = clients
        .iter()
        .filter(|m| m.connection_id == alice.connection_id)
        .count();
    assert_eq!(matching, 1);
    assert_eq!(clients.len(), 1);
}

#[tokio::test]
async fn test_joining_a_new_room_leaves_the_old_one() {
    init_tracing();
    let relay = create_test_relay();

    let mut alice = TestConnection::connect(&relay, "alice");
    let mut bob = TestConnection::connect(&relay, "bob");

    alice.join("r1");
    alice.expect_joined().await;
    bob.join("r1");
    bob.expect_joined().await;
    alice.expect_room_update().await;

    // bob moves to another room; alice must see him vanish from r1
    bob.join("r2");

    let (room_id, clients) = alice.expect_room_update().await;
    assert_eq!(room_id, "r1".into());
    assert!(!clients.iter().any(|m| m.connection_id == bob.connection_id));

    let (room_id, _, clients) = bob.expect_joined().await;
    assert_eq!(room_id, "r2".into());
    assert_eq!(clients.len(), 1);
}

#[tokio::test]
async fn test_join_with_empty_room_id_is_rejected() {
    init_tracing();
    let relay = create_test_relay();

    let mut alice = TestConnection::connect(&relay, "alice");
    alice.join("  ");

    let message = alice.expect_error().await;
    assert!(message.contains("Room ID"));

    // the connection stays usable
    alice.send_event(flare_core::ClientEvent::Ping);
    assert!(matches!(alice.recv().await, ServerEvent::Pong { .. }));
}
