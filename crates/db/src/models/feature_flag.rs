//! Feature flag model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use streamsource_core::feature_flags::FlagGates;
use streamsource_core::types::{DbId, Timestamp};

/// A row from the `feature_flags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FeatureFlag {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub percentage: i16,
    pub actor_ids: Vec<DbId>,
    pub groups: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FeatureFlag {
    pub fn gates(&self) -> FlagGates {
        FlagGates {
            enabled: self.enabled,
            percentage: self.percentage,
            actor_ids: self.actor_ids.clone(),
            groups: self.groups.clone(),
        }
    }
}

/// DTO for creating (or redefining) a flag.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertFeatureFlag {
    pub name: String,
    pub description: Option<String>,
    pub enabled: Option<bool>,
}

/// Body of `PUT /admin/feature-flags/{name}/percentage`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPercentage {
    pub percentage: i16,
}
