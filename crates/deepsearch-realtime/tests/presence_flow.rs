//! End-to-end presence flows through the connection manager: join fan-out,
//! roster snapshots, block toggling, and disconnect cleanup.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use deepsearch_core::config::realtime::RealtimeConfig;
use deepsearch_core::types::{DocumentId, UserId};
use deepsearch_entity::presence::{EventType, PresenceEvent, Reader};
use deepsearch_realtime::channel::TopicRegistry;
use deepsearch_realtime::connection::handle::WireFrame;
use deepsearch_realtime::connection::manager::ConnectionManager;
use deepsearch_realtime::roster::RosterRegistry;

fn manager() -> ConnectionManager {
    ConnectionManager::new(
        RealtimeConfig::default(),
        Arc::new(TopicRegistry::new()),
        Arc::new(RosterRegistry::new()),
    )
}

async fn next_event(rx: &mut mpsc::Receiver<WireFrame>) -> PresenceEvent {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event expected before timeout")
            .expect("connection open");
        if let WireFrame::Event(text) = frame {
            return serde_json::from_str(&text).expect("valid envelope");
        }
    }
}

fn join_frame(user: &str, doc: &str) -> String {
    let reader = Reader::new(
        UserId::new(user),
        format!("user-{user}"),
        None,
        DocumentId::new(doc),
        Utc::now(),
    );
    let event = PresenceEvent::viewer_joined(UserId::new(user), DocumentId::new(doc), reader);
    serde_json::to_string(&event).expect("serialize")
}

#[tokio::test]
async fn test_join_fans_out_to_prior_viewers() {
    let manager = manager();

    let (conn_b, mut rx_b) = manager.register(UserId::new("u2"), "u2".to_string());
    manager.handle_inbound(&conn_b.id, &join_frame("u2", "doc-1")).await;

    let (conn_a, mut rx_a) = manager.register(UserId::new("u1"), "u1".to_string());
    manager.handle_inbound(&conn_a.id, &join_frame("u1", "doc-1")).await;

    // The prior viewer learns about the join.
    let seen_by_b = next_event(&mut rx_b).await;
    assert_eq!(seen_by_b.message_type, EventType::ViewerJoined);
    let joined = seen_by_b.user.expect("reader snapshot");
    assert_eq!(joined.id, UserId::new("u1"));
    assert!(!joined.is_blocked);

    // The joiner gets a snapshot of who was already there.
    let snapshot = next_event(&mut rx_a).await;
    assert_eq!(snapshot.message_type, EventType::ViewerJoined);
    let users = snapshot.users.expect("roster snapshot");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, UserId::new("u2"));

    assert_eq!(manager.total_connections(), 2);
    assert_eq!(manager.unique_users(), 2);
}

#[tokio::test]
async fn test_repeated_join_stays_single_roster_entry() {
    let manager = manager();
    let doc = DocumentId::new("doc-1");

    let (conn_b, mut rx_b) = manager.register(UserId::new("u2"), "u2".to_string());
    manager.handle_inbound(&conn_b.id, &join_frame("u2", "doc-1")).await;

    let (conn_a, _rx_a) = manager.register(UserId::new("u1"), "u1".to_string());
    manager.handle_inbound(&conn_a.id, &join_frame("u1", "doc-1")).await;
    manager.handle_inbound(&conn_a.id, &join_frame("u1", "doc-1")).await;

    // B sees two join events, but its roster-by-key stays at one record.
    let roster = RosterRegistry::new();
    roster.apply_event(&next_event(&mut rx_b).await);
    roster.apply_event(&next_event(&mut rx_b).await);
    assert_eq!(roster.document_readers(&doc).len(), 1);
}

#[tokio::test]
async fn test_block_toggle_roundtrip_between_clients() {
    let manager = manager();
    let doc = DocumentId::new("doc-1");

    let (conn_a, mut rx_a) = manager.register(UserId::new("u1"), "u1".to_string());
    manager.handle_inbound(&conn_a.id, &join_frame("u1", "doc-1")).await;

    let (conn_b, _rx_b) = manager.register(UserId::new("u2"), "u2".to_string());
    manager.handle_inbound(&conn_b.id, &join_frame("u2", "doc-1")).await;
    // Drain the join fan-out A received for B.
    let _ = next_event(&mut rx_a).await;

    // A's local mirror of the roster, as a client would keep it.
    let mirror = RosterRegistry::new();
    mirror.upsert(Reader::new(
        UserId::new("u1"),
        "u1",
        None,
        doc.clone(),
        Utc::now(),
    ));

    let toggle = PresenceEvent::block_toggled(
        UserId::new("u2"),
        doc.clone(),
        UserId::new("u1"),
        None,
    );
    let frame = serde_json::to_string(&toggle).expect("serialize");

    manager.handle_inbound(&conn_b.id, &frame).await;
    let first = next_event(&mut rx_a).await;
    assert_eq!(first.message_type, EventType::BlockToggled);
    assert!(first.user.as_ref().expect("snapshot").is_blocked);
    mirror.apply_event(&first);
    assert!(
        mirror
            .get(&doc, &UserId::new("u1"))
            .expect("record")
            .is_blocked
    );

    // Toggling again returns the reader to unblocked: involution.
    manager.handle_inbound(&conn_b.id, &frame).await;
    let second = next_event(&mut rx_a).await;
    assert!(!second.user.as_ref().expect("snapshot").is_blocked);
    mirror.apply_event(&second);
    assert!(
        !mirror
            .get(&doc, &UserId::new("u1"))
            .expect("record")
            .is_blocked
    );
}

#[tokio::test]
async fn test_block_toggle_for_unknown_reader_is_dropped() {
    let manager = manager();
    let (conn_a, mut rx_a) = manager.register(UserId::new("u1"), "u1".to_string());
    manager.handle_inbound(&conn_a.id, &join_frame("u1", "doc-1")).await;

    let toggle = PresenceEvent::block_toggled(
        UserId::new("u1"),
        DocumentId::new("doc-1"),
        UserId::new("ghost"),
        None,
    );
    manager
        .handle_inbound(&conn_a.id, &serde_json::to_string(&toggle).expect("serialize"))
        .await;

    // No fan-out happened; the queue stays quiet.
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn test_disconnect_removes_reader_and_notifies_peers() {
    let manager = manager();
    let doc = DocumentId::new("doc-1");

    let (conn_b, mut rx_b) = manager.register(UserId::new("u2"), "u2".to_string());
    manager.handle_inbound(&conn_b.id, &join_frame("u2", "doc-1")).await;

    let (conn_a, _rx_a) = manager.register(UserId::new("u1"), "u1".to_string());
    manager.handle_inbound(&conn_a.id, &join_frame("u1", "doc-1")).await;

    let mirror = RosterRegistry::new();
    mirror.apply_event(&next_event(&mut rx_b).await);
    assert_eq!(mirror.document_readers(&doc).len(), 1);

    // A's tab closes without an explicit leave.
    manager.unregister(&conn_a.id).await;

    let left = next_event(&mut rx_b).await;
    assert_eq!(left.message_type, EventType::ViewerLeft);
    assert_eq!(left.sender_id, UserId::new("u1"));
    mirror.apply_event(&left);
    assert!(mirror.document_readers(&doc).is_empty());
    assert_eq!(manager.unique_users(), 1);
}

#[tokio::test]
async fn test_explicit_leave_is_noop_for_unknown_key() {
    let manager = manager();
    let (conn_a, mut rx_a) = manager.register(UserId::new("u1"), "u1".to_string());

    let leave = PresenceEvent::viewer_left(UserId::new("u1"), DocumentId::new("doc-9"));
    manager
        .handle_inbound(&conn_a.id, &serde_json::to_string(&leave).expect("serialize"))
        .await;

    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn test_malformed_and_unknown_frames_are_dropped() {
    let manager = manager();
    let (conn_a, mut rx_a) = manager.register(UserId::new("u1"), "u1".to_string());
    manager.handle_inbound(&conn_a.id, &join_frame("u1", "doc-1")).await;

    manager.handle_inbound(&conn_a.id, "{{{ not json").await;
    manager
        .handle_inbound(
            &conn_a.id,
            r#"{"senderId":"u1","messageType":"cursor-moved","documentId":"doc-1"}"#,
        )
        .await;

    assert!(rx_a.try_recv().is_err());
    assert!(conn_a.is_open());
}

#[tokio::test]
async fn test_max_connections_per_user_replaces_oldest() {
    let mut config = RealtimeConfig::default();
    config.max_connections_per_user = 2;
    let manager = ConnectionManager::new(
        config,
        Arc::new(TopicRegistry::new()),
        Arc::new(RosterRegistry::new()),
    );

    let (first, _rx1) = manager.register(UserId::new("u1"), "u1".to_string());
    let (_second, _rx2) = manager.register(UserId::new("u1"), "u1".to_string());
    let (_third, _rx3) = manager.register(UserId::new("u1"), "u1".to_string());

    assert!(!first.is_open());
    assert_eq!(manager.total_connections(), 2);
}
