use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use streamsource_core::collaboration::{
    color_for_user, validate_cell, CellKey, Channel, CollabMessage, LockInfo, LockOutcome,
};
use streamsource_core::feature_flags::COLLABORATIVE_EDITING;
use streamsource_core::types::DbId;

use crate::error::AppError;
use crate::features;
use crate::handlers::streams::apply_cell_edit;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::ws::manager::{json_message, WsManager};

/// HTTP handler that upgrades the connection to WebSocket.
///
/// Authentication happens before the upgrade; browsers pass the access
/// token as `?token=<jwt>`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    user: AuthUser,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, user))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket, registers the connection with `WsManager`, forwards the
/// manager channel to the sink on a spawned task, and dispatches inbound
/// collaboration messages on the current task until the peer disconnects.
async fn handle_socket(socket: WebSocket, state: AppState, user: AuthUser) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id = user.user_id, "WebSocket connected");

    let mut rx = state.ws_manager.add(conn_id.clone(), user.user_id).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => handle_text(&state, &conn_id, &user, &text).await,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    disconnect(&state, &conn_id, user.user_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, user_id = user.user_id, "WebSocket disconnected");
}

/// Parse and handle one text frame from a registered connection.
pub async fn handle_text(state: &AppState, conn_id: &str, user: &AuthUser, text: &str) {
    match serde_json::from_str::<CollabMessage>(text) {
        Ok(msg) => dispatch(state, conn_id, user, msg).await,
        Err(e) => {
            reply(
                &state.ws_manager,
                conn_id,
                &CollabMessage::error(format!("Unrecognised message: {e}")),
            )
            .await;
        }
    }
}

/// Release everything a closed connection held and unregister it.
pub async fn disconnect(state: &AppState, conn_id: &str, user_id: DbId) {
    leave_session(state, conn_id, user_id).await;
    state.ws_manager.remove(conn_id).await;
}

/// Handle one client message.
pub async fn dispatch(state: &AppState, conn_id: &str, user: &AuthUser, msg: CollabMessage) {
    let manager = &state.ws_manager;
    match msg {
        CollabMessage::Subscribe {
            channel: Channel::Collaboration,
        } => subscribe(state, conn_id, user).await,
        CollabMessage::Subscribe {
            channel: Channel::Entities,
        } => {
            if manager.set_entities(conn_id, true).await == Some(false) {
                tracing::debug!(conn_id = %conn_id, "Subscribed to entity events");
            }
            reply(
                manager,
                conn_id,
                &CollabMessage::Subscribed {
                    channel: Channel::Entities,
                },
            )
            .await;
        }
        CollabMessage::Unsubscribe {
            channel: Channel::Collaboration,
        } => {
            leave_session(state, conn_id, user.user_id).await;
        }
        CollabMessage::Unsubscribe {
            channel: Channel::Entities,
        } => {
            manager.set_entities(conn_id, false).await;
        }
        CollabMessage::LockCell { stream_id, column } => {
            if let Err(message) = ensure_collaborating(state, conn_id, user, stream_id, &column).await
            {
                reply(manager, conn_id, &CollabMessage::error(message)).await;
                return;
            }
            let key = CellKey::new(stream_id, column);
            match state.lock_broker.acquire(key, user.user_id, conn_id, Utc::now()) {
                LockOutcome::Granted { lock, released } => {
                    for old in &released {
                        broadcast(manager, &CollabMessage::unlocked(old)).await;
                    }
                    tracing::debug!(
                        user_id = user.user_id,
                        stream_id = lock.stream_id,
                        column = %lock.column,
                        "Cell locked",
                    );
                    broadcast(manager, &CollabMessage::locked(&lock)).await;
                }
                LockOutcome::Refreshed(lock) => {
                    broadcast(manager, &CollabMessage::locked(&lock)).await;
                }
                LockOutcome::Denied(holder) => {
                    reply(manager, conn_id, &CollabMessage::denied(&holder)).await;
                }
            }
        }
        CollabMessage::UnlockCell { stream_id, column } => {
            let key = CellKey::new(stream_id, column);
            if let Some(lock) = state.lock_broker.release(&key, user.user_id) {
                broadcast(manager, &CollabMessage::unlocked(&lock)).await;
            }
        }
        CollabMessage::UpdateCell {
            stream_id,
            column,
            value,
        } => update_cell(state, conn_id, user, stream_id, column, value).await,
        // Server-to-client messages are not accepted from clients.
        _ => {
            reply(
                manager,
                conn_id,
                &CollabMessage::error("Message type is not accepted from clients"),
            )
            .await;
        }
    }
}

async fn subscribe(state: &AppState, conn_id: &str, user: &AuthUser) {
    let manager = &state.ws_manager;
    match features::is_enabled(&state.pool, COLLABORATIVE_EDITING, Some(user)).await {
        Ok(true) => {}
        Ok(false) => {
            reply(
                manager,
                conn_id,
                &CollabMessage::error("Collaborative editing is not enabled"),
            )
            .await;
            return;
        }
        Err(e) => {
            tracing::error!(conn_id = %conn_id, error = %e, "Feature flag lookup failed");
            reply(manager, conn_id, &CollabMessage::error("Could not join session")).await;
            return;
        }
    }

    let already_present = manager.is_collaborating(user.user_id).await;
    if manager.set_collaborating(conn_id, true).await == Some(true) {
        return;
    }

    let now = Utc::now();
    let session = CollabMessage::SessionState {
        locks: state
            .lock_broker
            .snapshot(now)
            .iter()
            .map(LockInfo::from)
            .collect(),
        users: manager.collaborators().await,
        edit_timeout_secs: state.lock_broker.timeout_secs(),
    };
    reply(manager, conn_id, &session).await;

    if !already_present {
        tracing::info!(user_id = user.user_id, "Collaborator joined");
        if let Some(frame) = json_message(&CollabMessage::UserJoined {
            user_id: user.user_id,
            color: color_for_user(user.user_id).to_string(),
        }) {
            manager.broadcast_collab(frame, Some(conn_id)).await;
        }
    }
}

/// Drop a connection from the session: release its locks and announce the
/// user's departure once their last collaborating connection is gone.
async fn leave_session(state: &AppState, conn_id: &str, user_id: i64) {
    let manager = &state.ws_manager;
    for lock in state.lock_broker.release_connection(conn_id) {
        broadcast(manager, &CollabMessage::unlocked(&lock)).await;
    }
    if manager.set_collaborating(conn_id, false).await == Some(true)
        && !manager.is_collaborating(user_id).await
    {
        tracing::info!(user_id, "Collaborator left");
        broadcast(manager, &CollabMessage::UserLeft { user_id }).await;
    }
}

async fn ensure_collaborating(
    state: &AppState,
    conn_id: &str,
    user: &AuthUser,
    stream_id: i64,
    column: &str,
) -> Result<(), String> {
    if !user.role.can_write() {
        return Err("Editor or Admin role required".into());
    }
    if !state.ws_manager.in_session(conn_id).await {
        return Err("Send subscribe before locking cells".into());
    }
    validate_cell(stream_id, column)
}

async fn update_cell(
    state: &AppState,
    conn_id: &str,
    user: &AuthUser,
    stream_id: DbId,
    column: String,
    value: String,
) {
    let manager = &state.ws_manager;
    let key = CellKey::new(stream_id, column.clone());

    // Renewing up front keeps the lock alive for the duration of the write.
    if let Err(holder) = state.lock_broker.renew(&key, user.user_id, conn_id, Utc::now()) {
        let message = match holder {
            Some(holder) => CollabMessage::denied(&holder),
            None => CollabMessage::error("Lock the cell before editing it"),
        };
        reply(manager, conn_id, &message).await;
        return;
    }

    match apply_cell_edit(state, user, stream_id, &column, &value).await {
        Ok(edit) => {
            tracing::info!(user_id = user.user_id, stream_id, column = %column, "Cell updated");
            for (column, value) in edit.cells {
                broadcast(
                    manager,
                    &CollabMessage::CellUpdated {
                        stream_id,
                        column,
                        value,
                        user_id: user.user_id,
                    },
                )
                .await;
            }
            if let Some(lock) = state.lock_broker.release(&key, user.user_id) {
                broadcast(manager, &CollabMessage::unlocked(&lock)).await;
            }
        }
        Err(err) => {
            reply(manager, conn_id, &CollabMessage::error(error_message(&err))).await;
        }
    }
}

/// Client-facing text for a failed write.
fn error_message(err: &AppError) -> String {
    match err {
        AppError::Core(core) => core.to_string(),
        AppError::BadRequest(msg) => msg.clone(),
        AppError::Database(_) | AppError::InternalError(_) => {
            tracing::error!(error = %err, "Cell update failed");
            "Could not save the change".to_string()
        }
    }
}

async fn reply(manager: &Arc<WsManager>, conn_id: &str, msg: &CollabMessage) {
    if let Some(frame) = json_message(msg) {
        manager.send_to(conn_id, frame).await;
    }
}

async fn broadcast(manager: &Arc<WsManager>, msg: &CollabMessage) {
    if let Some(frame) = json_message(msg) {
        manager.broadcast_collab(frame, None).await;
    }
}
