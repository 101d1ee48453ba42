//! Expires collaborative cell locks whose edit timeout has passed and
//! tells collaborators the cells are free again.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use streamsource_core::collaboration::{CellLockBroker, CollabMessage, LOCK_SWEEP_INTERVAL_MS};
use streamsource_core::types::Timestamp;
use tokio_util::sync::CancellationToken;

use crate::ws::manager::json_message;
use crate::ws::WsManager;

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(
    broker: Arc<CellLockBroker>,
    ws_manager: Arc<WsManager>,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_ms = LOCK_SWEEP_INTERVAL_MS,
        timeout_secs = broker.timeout_secs(),
        "Cell lock sweeper started"
    );

    let mut interval = tokio::time::interval(Duration::from_millis(LOCK_SWEEP_INTERVAL_MS));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Cell lock sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                sweep_once(&broker, &ws_manager, Utc::now()).await;
            }
        }
    }
}

/// Drop locks expired at `now` and broadcast `cell_unlocked` for each.
/// Returns how many were dropped.
pub async fn sweep_once(broker: &CellLockBroker, ws_manager: &WsManager, now: Timestamp) -> usize {
    let expired = broker.sweep_expired(now);
    for lock in &expired {
        tracing::debug!(
            stream_id = lock.stream_id,
            column = %lock.column,
            user_id = lock.user_id,
            "Cell lock expired"
        );
        if let Some(frame) = json_message(&CollabMessage::unlocked(lock)) {
            ws_manager.broadcast_collab(frame, None).await;
        }
    }
    expired.len()
}
