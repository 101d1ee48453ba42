//! Repository for `refresh_sessions`.
//!
//! A refresh token is single-use: [`SessionRepo::rotate`] consumes it in the
//! same statement that looks it up, so two concurrent refreshes with one
//! token cannot both succeed.

use sqlx::PgPool;
use streamsource_core::types::DbId;

use crate::models::session::{NewRefreshSession, RefreshSession, RevokeReason};

const COLUMNS: &str = "id, user_id, token_fingerprint, issued_role, user_agent, expires_at, \
                       revoked_at, revoke_reason, created_at, updated_at";

/// How long revoked rows are kept before cleanup deletes them.
const REVOKED_RETENTION: &str = "1 day";

pub struct SessionRepo;

impl SessionRepo {
    pub async fn open(
        pool: &PgPool,
        input: &NewRefreshSession,
    ) -> Result<RefreshSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_sessions (user_id, token_fingerprint, issued_role, user_agent, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshSession>(&query)
            .bind(input.user_id)
            .bind(&input.token_fingerprint)
            .bind(&input.issued_role)
            .bind(&input.user_agent)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Consume a refresh token.
    ///
    /// Marks the matching live session as rotated and returns it. `None`
    /// when the token is unknown, expired, or already used.
    pub async fn rotate(
        pool: &PgPool,
        fingerprint: &str,
    ) -> Result<Option<RefreshSession>, sqlx::Error> {
        let query = format!(
            "UPDATE refresh_sessions
             SET revoked_at = NOW(), revoke_reason = $2
             WHERE token_fingerprint = $1
               AND revoked_at IS NULL
               AND expires_at > NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshSession>(&query)
            .bind(fingerprint)
            .bind(RevokeReason::Rotated.as_str())
            .fetch_optional(pool)
            .await
    }

    /// End every live session of a user. Returns how many were revoked.
    pub async fn revoke_all_for_user(
        pool: &PgPool,
        user_id: DbId,
        reason: RevokeReason,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_sessions
             SET revoked_at = NOW(), revoke_reason = $2
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .bind(reason.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete expired sessions and sessions revoked more than a day ago.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let query = format!(
            "DELETE FROM refresh_sessions
             WHERE expires_at < NOW()
                OR revoked_at < NOW() - INTERVAL '{REVOKED_RETENTION}'"
        );
        let result = sqlx::query(&query).execute(pool).await?;
        Ok(result.rows_affected())
    }
}
