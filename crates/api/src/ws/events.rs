//! Forwards entity change events from the bus to WebSocket clients
//! subscribed to the `entities` channel.

use std::sync::Arc;

use serde::Serialize;
use streamsource_events::{EntityEvent, EventBus};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::ws::manager::{json_message, WsManager};

/// Frame pushed to clients for every entity change.
#[derive(Debug, Serialize)]
struct EntityChanged<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    event: &'a EntityEvent,
}

/// Spawn the forwarding task. It stops when `cancel` fires or the bus closes.
pub fn start_event_forwarder(
    event_bus: Arc<EventBus>,
    ws_manager: Arc<WsManager>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = rx.recv() => match received {
                    Ok(event) => {
                        let frame = EntityChanged { kind: "entity_changed", event: &event };
                        if let Some(message) = json_message(&frame) {
                            let reached = ws_manager.broadcast_entities(message).await;
                            tracing::trace!(
                                entity = %event.entity_type,
                                entity_id = event.entity_id,
                                reached,
                                "Entity event forwarded"
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Entity event forwarder lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        tracing::info!("Entity event forwarder stopped");
    })
}
