//! Repository for the `feature_flags` table.
//!
//! Flags are addressed by name. Gate arrays are edited in place with
//! `array_append` / `array_remove` so concurrent admin edits do not clobber
//! each other.

use sqlx::PgPool;
use streamsource_core::types::DbId;

use crate::models::feature_flag::{FeatureFlag, UpsertFeatureFlag};

const COLUMNS: &str =
    "id, name, description, enabled, percentage, actor_ids, groups, created_at, updated_at";

pub struct FeatureFlagRepo;

impl FeatureFlagRepo {
    pub async fn find_by_name(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<FeatureFlag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM feature_flags WHERE name = $1");
        sqlx::query_as::<_, FeatureFlag>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<FeatureFlag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM feature_flags ORDER BY name ASC");
        sqlx::query_as::<_, FeatureFlag>(&query).fetch_all(pool).await
    }

    /// Create a flag, or update the description/boolean gate of an existing one.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertFeatureFlag,
    ) -> Result<FeatureFlag, sqlx::Error> {
        let query = format!(
            "INSERT INTO feature_flags (name, description, enabled)
             VALUES ($1, $2, COALESCE($3, false))
             ON CONFLICT (name) DO UPDATE SET
                description = COALESCE(EXCLUDED.description, feature_flags.description),
                enabled = COALESCE($3, feature_flags.enabled)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FeatureFlag>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.enabled)
            .fetch_one(pool)
            .await
    }

    /// Set the boolean gate.
    pub async fn set_enabled(
        pool: &PgPool,
        name: &str,
        enabled: bool,
    ) -> Result<Option<FeatureFlag>, sqlx::Error> {
        let query =
            format!("UPDATE feature_flags SET enabled = $2 WHERE name = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, FeatureFlag>(&query)
            .bind(name)
            .bind(enabled)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_percentage(
        pool: &PgPool,
        name: &str,
        percentage: i16,
    ) -> Result<Option<FeatureFlag>, sqlx::Error> {
        let query =
            format!("UPDATE feature_flags SET percentage = $2 WHERE name = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, FeatureFlag>(&query)
            .bind(name)
            .bind(percentage)
            .fetch_optional(pool)
            .await
    }

    /// Add a user to the actor gate (idempotent).
    pub async fn add_actor(
        pool: &PgPool,
        name: &str,
        user_id: DbId,
    ) -> Result<Option<FeatureFlag>, sqlx::Error> {
        let query = format!(
            "UPDATE feature_flags SET
                actor_ids = CASE WHEN $2 = ANY(actor_ids) THEN actor_ids
                                 ELSE array_append(actor_ids, $2) END
             WHERE name = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FeatureFlag>(&query)
            .bind(name)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn remove_actor(
        pool: &PgPool,
        name: &str,
        user_id: DbId,
    ) -> Result<Option<FeatureFlag>, sqlx::Error> {
        let query = format!(
            "UPDATE feature_flags SET actor_ids = array_remove(actor_ids, $2)
             WHERE name = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FeatureFlag>(&query)
            .bind(name)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Add a role name to the group gate (idempotent).
    pub async fn add_group(
        pool: &PgPool,
        name: &str,
        group: &str,
    ) -> Result<Option<FeatureFlag>, sqlx::Error> {
        let query = format!(
            "UPDATE feature_flags SET
                groups = CASE WHEN $2 = ANY(groups) THEN groups
                              ELSE array_append(groups, $2) END
             WHERE name = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FeatureFlag>(&query)
            .bind(name)
            .bind(group)
            .fetch_optional(pool)
            .await
    }

    pub async fn remove_group(
        pool: &PgPool,
        name: &str,
        group: &str,
    ) -> Result<Option<FeatureFlag>, sqlx::Error> {
        let query = format!(
            "UPDATE feature_flags SET groups = array_remove(groups, $2)
             WHERE name = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FeatureFlag>(&query)
            .bind(name)
            .bind(group)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM feature_flags WHERE name = $1")
            .bind(name)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
