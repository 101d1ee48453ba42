//! Archives streams that have not been checked for a configured number of
//! hours. Only runs while the `auto_archive_streams` flag is enabled.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use streamsource_core::feature_flags::AUTO_ARCHIVE_STREAMS;
use streamsource_db::repositories::StreamRepo;
use streamsource_events::{EntityEvent, EventBus};
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;
use crate::features;

const ARCHIVE_INTERVAL: Duration = Duration::from_secs(3600);

/// Run the archive loop until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    event_bus: Arc<EventBus>,
    archive_after_hours: i64,
    cancel: CancellationToken,
) {
    tracing::info!(
        archive_after_hours,
        interval_secs = ARCHIVE_INTERVAL.as_secs(),
        "Stream archiver started"
    );

    let mut interval = tokio::time::interval(ARCHIVE_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stream archiver stopping");
                break;
            }
            _ = interval.tick() => {
                match archive_once(&pool, &event_bus, archive_after_hours).await {
                    Ok(Some(0)) => tracing::debug!("Stream archiver: nothing stale"),
                    Ok(Some(archived)) => tracing::info!(archived, "Stream archiver: archived stale streams"),
                    Ok(None) => tracing::debug!("Stream archiver: flag disabled, skipping"),
                    Err(e) => tracing::error!(error = %e, "Stream archiver failed"),
                }
            }
        }
    }
}

/// One archive pass. Returns `None` when the flag is off, otherwise the
/// number of archived streams.
pub async fn archive_once(
    pool: &PgPool,
    event_bus: &EventBus,
    archive_after_hours: i64,
) -> AppResult<Option<usize>> {
    if !features::is_enabled(pool, AUTO_ARCHIVE_STREAMS, None).await? {
        return Ok(None);
    }
    let cutoff = Utc::now() - chrono::Duration::hours(archive_after_hours);
    let ids = StreamRepo::archive_stale(pool, cutoff).await?;
    for id in &ids {
        event_bus.publish(EntityEvent::updated("stream", *id));
    }
    Ok(Some(ids.len()))
}
