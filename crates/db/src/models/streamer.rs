//! Streamer and streamer account models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use streamsource_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Streamer
// ---------------------------------------------------------------------------

/// A row from the `streamers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Streamer {
    pub id: DbId,
    pub name: String,
    pub notes: Option<String>,
    pub posted_by: Option<String>,
    pub user_id: DbId,
    pub location_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStreamer {
    pub name: String,
    pub notes: Option<String>,
    pub posted_by: Option<String>,
    pub location_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStreamer {
    pub name: Option<String>,
    pub notes: Option<String>,
    pub posted_by: Option<String>,
    pub location_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// StreamerAccount
// ---------------------------------------------------------------------------

/// A row from the `streamer_accounts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StreamerAccount {
    pub id: DbId,
    pub streamer_id: DbId,
    pub platform: String,
    pub username: String,
    pub profile_url: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for adding an account to a streamer.
///
/// `profile_url` is derived from platform and username when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStreamerAccount {
    pub platform: String,
    pub username: String,
    pub profile_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStreamerAccount {
    pub platform: Option<String>,
    pub username: Option<String>,
    pub profile_url: Option<String>,
    pub is_active: Option<bool>,
}
