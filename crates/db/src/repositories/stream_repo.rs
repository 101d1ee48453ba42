//! Repository for the `streams` table.

use sqlx::PgPool;
use streamsource_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use streamsource_core::stream::StatusTimestamps;
use streamsource_core::types::{DbId, Timestamp};

use crate::models::stream::{CreateStream, Stream, StreamFilter, StreamSort, UpdateStream};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, link, source, title, platform, status, orientation, kind, city, state, \
                       location_id, notes, posted_by, is_pinned, is_archived, user_id, streamer_id, \
                       last_checked_at, last_live_at, started_at, ended_at, created_at, updated_at";

/// `ended_at` on archive: keep it only when the stream is not live and it
/// closes the latest live session.
const ARCHIVE_ENDED_AT: &str = "CASE
    WHEN status <> 'live'
         AND ended_at IS NOT NULL
         AND (last_live_at IS NULL OR ended_at >= last_live_at)
    THEN ended_at
    ELSE NOW()
END";

/// `WHERE` clause shared by `list` and `count`; binds `$1..=$8`.
const FILTER_CLAUSE: &str = "
    ($1::TEXT IS NULL OR status = $1)
    AND ($2::TEXT IS NULL OR platform = $2)
    AND ($3::TEXT IS NULL OR kind = $3)
    AND ($4::BOOLEAN IS NULL OR is_pinned = $4)
    AND is_archived = COALESCE($5::BOOLEAN, false)
    AND ($6::BIGINT IS NULL OR user_id = $6)
    AND ($7::BIGINT IS NULL OR streamer_id = $7)
    AND ($8::TEXT IS NULL
         OR source ILIKE '%' || $8 || '%'
         OR title ILIKE '%' || $8 || '%'
         OR link ILIKE '%' || $8 || '%'
         OR city ILIKE '%' || $8 || '%'
         OR state ILIKE '%' || $8 || '%')";

/// Provides CRUD and lifecycle operations for streams.
pub struct StreamRepo;

impl StreamRepo {
    /// Insert a new stream owned by `user_id`.
    ///
    /// `input.source` and `input.platform` must already be resolved.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateStream,
    ) -> Result<Stream, sqlx::Error> {
        let query = format!(
            "INSERT INTO streams
                (link, source, title, platform, status, orientation, kind, city, state,
                 location_id, notes, posted_by, streamer_id, is_pinned, user_id)
             VALUES ($1, COALESCE($2, ''), $3, COALESCE($4, 'other'), COALESCE($5, 'unknown'), $6,
                     COALESCE($7, 'video'), $8, $9, $10, $11, $12, $13, COALESCE($14, false), $15)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Stream>(&query)
            .bind(&input.link)
            .bind(&input.source)
            .bind(&input.title)
            .bind(&input.platform)
            .bind(&input.status)
            .bind(&input.orientation)
            .bind(&input.kind)
            .bind(&input.city)
            .bind(&input.state)
            .bind(input.location_id)
            .bind(&input.notes)
            .bind(&input.posted_by)
            .bind(input.streamer_id)
            .bind(input.is_pinned)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Stream>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM streams WHERE id = $1");
        sqlx::query_as::<_, Stream>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List streams matching `filter`. Pinned streams always come first.
    pub async fn list(pool: &PgPool, filter: &StreamFilter) -> Result<Vec<Stream>, sqlx::Error> {
        let limit = clamp_limit(filter.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let offset = clamp_offset(filter.offset);
        let order = StreamSort::parse(filter.sort.as_deref()).order_clause();
        let query = format!(
            "SELECT {COLUMNS} FROM streams
             WHERE {FILTER_CLAUSE}
             ORDER BY {order}
             LIMIT $9 OFFSET $10"
        );
        sqlx::query_as::<_, Stream>(&query)
            .bind(&filter.status)
            .bind(&filter.platform)
            .bind(&filter.kind)
            .bind(filter.is_pinned)
            .bind(filter.is_archived)
            .bind(filter.user_id)
            .bind(filter.streamer_id)
            .bind(&filter.search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count streams matching `filter` (ignoring limit/offset).
    pub async fn count(pool: &PgPool, filter: &StreamFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM streams WHERE {FILTER_CLAUSE}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(&filter.status)
            .bind(&filter.platform)
            .bind(&filter.kind)
            .bind(filter.is_pinned)
            .bind(filter.is_archived)
            .bind(filter.user_id)
            .bind(filter.streamer_id)
            .bind(&filter.search)
            .fetch_one(pool)
            .await
    }

    /// Update a stream. Only non-`None` fields in `input` are applied;
    /// `input.status` is ignored (see [`StreamRepo::set_status`]).
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateStream,
    ) -> Result<Option<Stream>, sqlx::Error> {
        let query = format!(
            "UPDATE streams SET
                link = COALESCE($2, link),
                source = COALESCE($3, source),
                title = COALESCE($4, title),
                platform = COALESCE($5, platform),
                orientation = COALESCE($6, orientation),
                kind = COALESCE($7, kind),
                city = COALESCE($8, city),
                state = COALESCE($9, state),
                location_id = COALESCE($10, location_id),
                notes = COALESCE($11, notes),
                posted_by = COALESCE($12, posted_by),
                streamer_id = COALESCE($13, streamer_id)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Stream>(&query)
            .bind(id)
            .bind(&input.link)
            .bind(&input.source)
            .bind(&input.title)
            .bind(&input.platform)
            .bind(&input.orientation)
            .bind(&input.kind)
            .bind(&input.city)
            .bind(&input.state)
            .bind(input.location_id)
            .bind(&input.notes)
            .bind(&input.posted_by)
            .bind(input.streamer_id)
            .fetch_optional(pool)
            .await
    }

    /// Set the status and apply the lifecycle timestamps computed by
    /// `streamsource_core::stream::apply_status_change`. `None` timestamps
    /// keep their current value; `EndChange::Clear` nulls `ended_at`.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        stamps: &StatusTimestamps,
    ) -> Result<Option<Stream>, sqlx::Error> {
        let query = format!(
            "UPDATE streams SET
                status = $2,
                last_checked_at = COALESCE($3, last_checked_at),
                last_live_at = COALESCE($4, last_live_at),
                started_at = COALESCE($5, started_at),
                ended_at = CASE WHEN $7 THEN NULL ELSE COALESCE($6, ended_at) END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Stream>(&query)
            .bind(id)
            .bind(status)
            .bind(stamps.last_checked_at)
            .bind(stamps.last_live_at)
            .bind(stamps.started_at)
            .bind(stamps.ended_at.stamp())
            .bind(stamps.ended_at.clears())
            .fetch_optional(pool)
            .await
    }

    /// Pin or unpin a stream.
    pub async fn set_pinned(
        pool: &PgPool,
        id: DbId,
        pinned: bool,
    ) -> Result<Option<Stream>, sqlx::Error> {
        let query = format!("UPDATE streams SET is_pinned = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Stream>(&query)
            .bind(id)
            .bind(pinned)
            .fetch_optional(pool)
            .await
    }

    /// Archive a stream: marks it archived, unpins it, and stamps `ended_at`
    /// unless it already holds the end of the latest session.
    pub async fn archive(pool: &PgPool, id: DbId) -> Result<Option<Stream>, sqlx::Error> {
        let query = format!(
            "UPDATE streams SET
                is_archived = true,
                is_pinned = false,
                ended_at = {ARCHIVE_ENDED_AT}
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Stream>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Archive every unpinned, unarchived stream not checked since `cutoff`.
    ///
    /// Streams never checked are judged by `created_at`. Returns the ids of
    /// the archived rows.
    pub async fn archive_stale(pool: &PgPool, cutoff: Timestamp) -> Result<Vec<DbId>, sqlx::Error> {
        let query = format!(
            "UPDATE streams SET
                is_archived = true,
                ended_at = {ARCHIVE_ENDED_AT}
             WHERE is_archived = false
               AND is_pinned = false
               AND COALESCE(last_checked_at, created_at) < $1
             RETURNING id"
        );
        sqlx::query_scalar::<_, DbId>(&query)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// Permanently delete a stream. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM streams WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
