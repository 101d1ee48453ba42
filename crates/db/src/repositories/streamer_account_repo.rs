//! Repository for the `streamer_accounts` table.

use sqlx::PgPool;
use streamsource_core::types::DbId;

use crate::models::streamer::{CreateStreamerAccount, StreamerAccount, UpdateStreamerAccount};

const COLUMNS: &str =
    "id, streamer_id, platform, username, profile_url, is_active, created_at, updated_at";

pub struct StreamerAccountRepo;

impl StreamerAccountRepo {
    /// Add an account to a streamer. `input.profile_url` must already be
    /// resolved by the caller.
    pub async fn create(
        pool: &PgPool,
        streamer_id: DbId,
        input: &CreateStreamerAccount,
    ) -> Result<StreamerAccount, sqlx::Error> {
        let query = format!(
            "INSERT INTO streamer_accounts (streamer_id, platform, username, profile_url, is_active)
             VALUES ($1, $2, $3, $4, COALESCE($5, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StreamerAccount>(&query)
            .bind(streamer_id)
            .bind(&input.platform)
            .bind(&input.username)
            .bind(&input.profile_url)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find an account scoped to its streamer.
    pub async fn find(
        pool: &PgPool,
        streamer_id: DbId,
        id: DbId,
    ) -> Result<Option<StreamerAccount>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM streamer_accounts WHERE id = $1 AND streamer_id = $2");
        sqlx::query_as::<_, StreamerAccount>(&query)
            .bind(id)
            .bind(streamer_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_streamer(
        pool: &PgPool,
        streamer_id: DbId,
    ) -> Result<Vec<StreamerAccount>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM streamer_accounts
             WHERE streamer_id = $1
             ORDER BY platform ASC, username ASC"
        );
        sqlx::query_as::<_, StreamerAccount>(&query)
            .bind(streamer_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        streamer_id: DbId,
        id: DbId,
        input: &UpdateStreamerAccount,
    ) -> Result<Option<StreamerAccount>, sqlx::Error> {
        let query = format!(
            "UPDATE streamer_accounts SET
                platform = COALESCE($3, platform),
                username = COALESCE($4, username),
                profile_url = COALESCE($5, profile_url),
                is_active = COALESCE($6, is_active)
             WHERE id = $1 AND streamer_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StreamerAccount>(&query)
            .bind(id)
            .bind(streamer_id)
            .bind(&input.platform)
            .bind(&input.username)
            .bind(&input.profile_url)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, streamer_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM streamer_accounts WHERE id = $1 AND streamer_id = $2")
            .bind(id)
            .bind(streamer_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
