use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use serde::Serialize;
use streamsource_core::collaboration::Collaborator;
use streamsource_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Authenticated user behind the connection.
    pub user_id: DbId,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    pub connected_at: Timestamp,
    /// Whether the connection has joined the collaborative editing session.
    pub collaborating: bool,
    /// Whether the connection receives entity change events.
    pub entities: bool,
}

/// Manages all active WebSocket connections.
///
/// A connection receives nothing unsolicited until it subscribes: to the
/// collaboration session for cell broadcasts, or to the `entities` channel
/// for record change events.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String, user_id: DbId) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
            collaborating: false,
            entities: false,
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection, returning it if it was registered.
    pub async fn remove(&self, conn_id: &str) -> Option<WsConnection> {
        self.connections.write().await.remove(conn_id)
    }

    /// Join or leave the collaboration session. Returns the previous state,
    /// or `None` for an unknown connection.
    pub async fn set_collaborating(&self, conn_id: &str, collaborating: bool) -> Option<bool> {
        let mut conns = self.connections.write().await;
        let conn = conns.get_mut(conn_id)?;
        let previous = conn.collaborating;
        conn.collaborating = collaborating;
        Some(previous)
    }

    /// Subscribe to or leave the `entities` channel. Returns the previous
    /// state, or `None` for an unknown connection.
    pub async fn set_entities(&self, conn_id: &str, subscribed: bool) -> Option<bool> {
        let mut conns = self.connections.write().await;
        let conn = conns.get_mut(conn_id)?;
        Some(std::mem::replace(&mut conn.entities, subscribed))
    }

    /// Whether this connection has joined the collaboration session.
    pub async fn in_session(&self, conn_id: &str) -> bool {
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|c| c.collaborating)
    }

    /// Whether `user_id` has any collaborating connection.
    pub async fn is_collaborating(&self, user_id: DbId) -> bool {
        self.connections
            .read()
            .await
            .values()
            .any(|c| c.collaborating && c.user_id == user_id)
    }

    /// Distinct users currently in the collaboration session, by user id.
    pub async fn collaborators(&self) -> Vec<Collaborator> {
        let conns = self.connections.read().await;
        let mut ids: Vec<DbId> = conns
            .values()
            .filter(|c| c.collaborating)
            .map(|c| c.user_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().map(Collaborator::new).collect()
    }

    /// Send a message to one connection. Returns `false` if it is gone.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        match self.connections.read().await.get(conn_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Send to every connection subscribed to `entities`. Returns how many
    /// connections were reached.
    ///
    /// Closed channels are skipped; their receive loop cleans them up.
    pub async fn broadcast_entities(&self, message: Message) -> usize {
        let conns = self.connections.read().await;
        conns
            .values()
            .filter(|c| c.entities)
            .filter(|c| c.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Broadcast to collaborating connections, optionally skipping one.
    pub async fn broadcast_collab(&self, message: Message, except: Option<&str>) {
        let conns = self.connections.read().await;
        for (id, conn) in conns.iter() {
            if conn.collaborating && Some(id.as_str()) != except {
                let _ = conn.sender.send(message.clone());
            }
        }
    }

    /// Send a message to all connections belonging to a user.
    ///
    /// Returns the number of connections the message was sent to.
    pub async fn send_to_user(&self, user_id: DbId, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn.user_id == user_id {
                let _ = conn.sender.send(message.clone());
                count += 1;
            }
        }
        count
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a payload into a text frame.
pub fn json_message<T: Serialize>(payload: &T) -> Option<Message> {
    match serde_json::to_string(payload) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize WebSocket payload");
            None
        }
    }
}
