//! Unit tests for `WsManager`.
//!
//! These drive the connection manager directly, without HTTP upgrades.

use axum::extract::ws::Message;
use streamsource_api::ws::WsManager;

fn text(value: &str) -> Message {
    Message::Text(value.into())
}

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();
    assert_eq!(manager.connection_count().await, 0);

    let _rx = manager.add("conn-1".to_string(), 1).await;
    assert_eq!(manager.connection_count().await, 1);

    assert!(manager.remove("nonexistent").await.is_none());
    assert_eq!(manager.connection_count().await, 1);

    let removed = manager.remove("conn-1").await.expect("registered");
    assert_eq!(removed.user_id, 1);
    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn broadcast_entities_reaches_only_entity_subscribers() {
    let manager = WsManager::new();
    let mut rx1 = manager.add("conn-1".to_string(), 1).await;
    let mut rx2 = manager.add("conn-2".to_string(), 2).await;
    manager.set_collaborating("conn-2", true).await;

    assert_eq!(manager.broadcast_entities(text("hello")).await, 0);

    assert_eq!(manager.set_entities("conn-1", true).await, Some(false));
    assert_eq!(manager.set_entities("ghost", true).await, None);
    assert_eq!(manager.broadcast_entities(text("hello")).await, 1);

    assert_eq!(rx1.try_recv().unwrap(), text("hello"));
    assert!(rx2.try_recv().is_err());

    assert_eq!(manager.set_entities("conn-1", false).await, Some(true));
    assert_eq!(manager.broadcast_entities(text("bye")).await, 0);
}

#[tokio::test]
async fn broadcast_collab_only_reaches_subscribers_except_sender() {
    let manager = WsManager::new();
    let mut rx1 = manager.add("conn-1".to_string(), 1).await;
    let mut rx2 = manager.add("conn-2".to_string(), 2).await;
    let mut rx3 = manager.add("conn-3".to_string(), 3).await;

    assert_eq!(manager.set_collaborating("conn-1", true).await, Some(false));
    assert_eq!(manager.set_collaborating("conn-2", true).await, Some(false));
    assert_eq!(manager.set_collaborating("ghost", true).await, None);

    manager.broadcast_collab(text("cell"), Some("conn-1")).await;

    assert!(rx1.try_recv().is_err());
    assert_eq!(rx2.try_recv().unwrap(), text("cell"));
    assert!(rx3.try_recv().is_err());
}

#[tokio::test]
async fn collaborators_are_distinct_users_in_session() {
    let manager = WsManager::new();
    let _a = manager.add("tab-a".to_string(), 7).await;
    let _b = manager.add("tab-b".to_string(), 7).await;
    let _c = manager.add("tab-c".to_string(), 3).await;
    let _d = manager.add("tab-d".to_string(), 9).await;

    for conn in ["tab-a", "tab-b", "tab-c"] {
        manager.set_collaborating(conn, true).await;
    }

    let ids: Vec<_> = manager.collaborators().await.iter().map(|c| c.user_id).collect();
    assert_eq!(ids, vec![3, 7]);
    assert!(manager.is_collaborating(7).await);
    assert!(!manager.is_collaborating(9).await);

    manager.set_collaborating("tab-a", false).await;
    assert!(!manager.in_session("tab-a").await);
    assert!(manager.is_collaborating(7).await);
}

#[tokio::test]
async fn send_to_user_reaches_all_their_connections() {
    let manager = WsManager::new();
    let mut phone = manager.add("phone".to_string(), 5).await;
    let mut laptop = manager.add("laptop".to_string(), 5).await;
    let mut other = manager.add("other".to_string(), 6).await;

    let sent = manager.send_to_user(5, Message::Close(None)).await;

    assert_eq!(sent, 2);
    assert_eq!(phone.try_recv().unwrap(), Message::Close(None));
    assert_eq!(laptop.try_recv().unwrap(), Message::Close(None));
    assert!(other.try_recv().is_err());
}

#[tokio::test]
async fn send_to_unknown_connection_returns_false() {
    let manager = WsManager::new();
    assert!(!manager.send_to("missing", text("x")).await);
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-1".to_string(), 1).await;

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    assert_eq!(rx.try_recv().unwrap(), Message::Close(None));
}
