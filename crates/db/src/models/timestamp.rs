//! Timestamp marker and timestamp-stream link models and DTOs.
//!
//! A timestamp marks a moment of interest; linking it to streams records
//! where in each recording the moment occurs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use streamsource_core::types::{DbId, Timestamp};

/// A row from the `timestamps` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TimestampMarker {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub event_timestamp: Timestamp,
    pub user_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTimestampMarker {
    pub title: String,
    pub description: Option<String>,
    pub event_timestamp: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTimestampMarker {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_timestamp: Option<Timestamp>,
}

/// Query parameters for listing timestamps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimestampFilter {
    /// Case-insensitive title/description match.
    pub search: Option<String>,
    pub stream_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A row from the `timestamp_streams` join table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TimestampStream {
    pub id: DbId,
    pub timestamp_id: DbId,
    pub stream_id: DbId,
    pub stream_timestamp_seconds: i32,
    pub added_by_user_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkTimestampStream {
    pub stream_id: DbId,
    /// Defaults to 0.
    pub stream_timestamp_seconds: Option<i32>,
}
