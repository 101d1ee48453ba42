//! Repository for the `streamers` table.

use sqlx::PgPool;
use streamsource_core::types::DbId;

use crate::models::streamer::{CreateStreamer, Streamer, UpdateStreamer};

const COLUMNS: &str = "id, name, notes, posted_by, user_id, location_id, created_at, updated_at";

pub struct StreamerRepo;

impl StreamerRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateStreamer,
    ) -> Result<Streamer, sqlx::Error> {
        let query = format!(
            "INSERT INTO streamers (name, notes, posted_by, location_id, user_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Streamer>(&query)
            .bind(&input.name)
            .bind(&input.notes)
            .bind(&input.posted_by)
            .bind(input.location_id)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Streamer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM streamers WHERE id = $1");
        sqlx::query_as::<_, Streamer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List streamers by name, optionally filtered by a name fragment.
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Streamer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM streamers
             WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%')
             ORDER BY LOWER(name) ASC, id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Streamer>(&query)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM streamers WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%')",
        )
        .bind(search)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateStreamer,
    ) -> Result<Option<Streamer>, sqlx::Error> {
        let query = format!(
            "UPDATE streamers SET
                name = COALESCE($2, name),
                notes = COALESCE($3, notes),
                posted_by = COALESCE($4, posted_by),
                location_id = COALESCE($5, location_id)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Streamer>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.notes)
            .bind(&input.posted_by)
            .bind(input.location_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a streamer. Accounts cascade; streams keep their row with
    /// `streamer_id` cleared.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM streamers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
