//! Stream entity model, DTOs, and list filter.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use streamsource_core::types::{DbId, Timestamp};

/// A row from the `streams` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Stream {
    pub id: DbId,
    pub link: String,
    pub source: String,
    pub title: Option<String>,
    pub platform: String,
    pub status: String,
    pub orientation: Option<String>,
    pub kind: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub location_id: Option<DbId>,
    pub notes: Option<String>,
    pub posted_by: Option<String>,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub user_id: DbId,
    pub streamer_id: Option<DbId>,
    pub last_checked_at: Option<Timestamp>,
    pub last_live_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a stream.
///
/// `source` and `platform` are resolved by the handler before insert
/// (streamer name / link host, and platform detection respectively).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStream {
    pub link: String,
    pub source: Option<String>,
    pub title: Option<String>,
    pub platform: Option<String>,
    /// Defaults to `unknown`.
    pub status: Option<String>,
    pub orientation: Option<String>,
    /// Defaults to `video`.
    pub kind: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub location_id: Option<DbId>,
    pub notes: Option<String>,
    pub posted_by: Option<String>,
    pub streamer_id: Option<DbId>,
    pub is_pinned: Option<bool>,
}

/// DTO for updating a stream. All fields are optional.
///
/// Status changes go through [`crate::repositories::StreamRepo::set_status`]
/// so lifecycle timestamps stay consistent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStream {
    pub link: Option<String>,
    pub source: Option<String>,
    pub title: Option<String>,
    pub platform: Option<String>,
    pub status: Option<String>,
    pub orientation: Option<String>,
    pub kind: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub location_id: Option<DbId>,
    pub notes: Option<String>,
    pub posted_by: Option<String>,
    pub streamer_id: Option<DbId>,
}

/// Query parameters for listing streams.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamFilter {
    pub status: Option<String>,
    pub platform: Option<String>,
    pub kind: Option<String>,
    pub is_pinned: Option<bool>,
    /// Archived streams are hidden unless this is `true`.
    pub is_archived: Option<bool>,
    pub user_id: Option<DbId>,
    pub streamer_id: Option<DbId>,
    /// Case-insensitive match on source, title, link, city, and state.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Column name, `-` prefix for descending. See [`StreamSort`].
    pub sort: Option<String>,
}

/// Whitelisted sort orders for stream listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamSort {
    #[default]
    NewestFirst,
    OldestFirst,
    RecentlyChecked,
    RecentlyLive,
    SourceAsc,
}

impl StreamSort {
    /// Parse a `sort` query value. Unknown values fall back to newest first.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("created_at") => StreamSort::OldestFirst,
            Some("-last_checked_at") => StreamSort::RecentlyChecked,
            Some("-last_live_at") => StreamSort::RecentlyLive,
            Some("source") => StreamSort::SourceAsc,
            _ => StreamSort::NewestFirst,
        }
    }

    /// SQL `ORDER BY` tail (pinned streams always sort first).
    pub fn order_clause(self) -> &'static str {
        match self {
            StreamSort::NewestFirst => "is_pinned DESC, created_at DESC, id DESC",
            StreamSort::OldestFirst => "is_pinned DESC, created_at ASC, id ASC",
            StreamSort::RecentlyChecked => {
                "is_pinned DESC, last_checked_at DESC NULLS LAST, id DESC"
            }
            StreamSort::RecentlyLive => "is_pinned DESC, last_live_at DESC NULLS LAST, id DESC",
            StreamSort::SourceAsc => "is_pinned DESC, LOWER(source) ASC, id ASC",
        }
    }
}
