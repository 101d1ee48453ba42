//! Ignore-list entry model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use streamsource_core::types::{DbId, Timestamp};

/// A row from the `ignore_lists` table. `value` is stored normalized.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IgnoreListEntry {
    pub id: DbId,
    pub list_type: String,
    pub value: String,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIgnoreListEntry {
    pub list_type: String,
    pub value: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateIgnoreListEntry {
    pub value: Option<String>,
    pub notes: Option<String>,
}

/// Body of `POST /admin/ignore-lists/bulk`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkIgnoreListImport {
    pub list_type: String,
    pub values: Vec<String>,
    pub notes: Option<String>,
}

/// Body of `POST /admin/ignore-lists/check`.
#[derive(Debug, Clone, Deserialize)]
pub struct IgnoreListCheck {
    pub link: Option<String>,
    pub twitch_user: Option<String>,
    pub discord_user: Option<String>,
}

/// Query parameters for listing ignore-list entries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IgnoreListFilter {
    pub list_type: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
