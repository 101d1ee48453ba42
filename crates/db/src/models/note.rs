//! Polymorphic note model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use streamsource_core::types::{DbId, Timestamp};

/// A row from the `notes` table. `notable_type` names the parent table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Note {
    pub id: DbId,
    pub notable_type: String,
    pub notable_id: DbId,
    pub content: String,
    pub user_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNote {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateNote {
    pub content: String,
}
