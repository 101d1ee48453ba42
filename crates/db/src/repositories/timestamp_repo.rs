//! Repository for the `timestamps` and `timestamp_streams` tables.

use sqlx::PgPool;
use streamsource_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use streamsource_core::types::DbId;

use crate::models::timestamp::{
    CreateTimestampMarker, LinkTimestampStream, TimestampFilter, TimestampMarker, TimestampStream,
    UpdateTimestampMarker,
};

const COLUMNS: &str = "id, title, description, event_timestamp, user_id, created_at, updated_at";

const LINK_COLUMNS: &str =
    "id, timestamp_id, stream_id, stream_timestamp_seconds, added_by_user_id, created_at, updated_at";

const FILTER_CLAUSE: &str = "
    ($1::TEXT IS NULL OR title ILIKE '%' || $1 || '%' OR description ILIKE '%' || $1 || '%')
    AND ($2::BIGINT IS NULL OR EXISTS (
        SELECT 1 FROM timestamp_streams s WHERE s.timestamp_id = timestamps.id AND s.stream_id = $2))";

pub struct TimestampRepo;

impl TimestampRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateTimestampMarker,
    ) -> Result<TimestampMarker, sqlx::Error> {
        let query = format!(
            "INSERT INTO timestamps (title, description, event_timestamp, user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TimestampMarker>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.event_timestamp)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TimestampMarker>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM timestamps WHERE id = $1");
        sqlx::query_as::<_, TimestampMarker>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &TimestampFilter,
    ) -> Result<Vec<TimestampMarker>, sqlx::Error> {
        let limit = clamp_limit(filter.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let offset = clamp_offset(filter.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM timestamps
             WHERE {FILTER_CLAUSE}
             ORDER BY event_timestamp DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, TimestampMarker>(&query)
            .bind(&filter.search)
            .bind(filter.stream_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &TimestampFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM timestamps WHERE {FILTER_CLAUSE}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(&filter.search)
            .bind(filter.stream_id)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTimestampMarker,
    ) -> Result<Option<TimestampMarker>, sqlx::Error> {
        let query = format!(
            "UPDATE timestamps SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                event_timestamp = COALESCE($4, event_timestamp)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TimestampMarker>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.event_timestamp)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM timestamps WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn link_stream(
        pool: &PgPool,
        timestamp_id: DbId,
        added_by_user_id: DbId,
        input: &LinkTimestampStream,
    ) -> Result<TimestampStream, sqlx::Error> {
        let query = format!(
            "INSERT INTO timestamp_streams
                (timestamp_id, stream_id, stream_timestamp_seconds, added_by_user_id)
             VALUES ($1, $2, COALESCE($3, 0), $4)
             RETURNING {LINK_COLUMNS}"
        );
        sqlx::query_as::<_, TimestampStream>(&query)
            .bind(timestamp_id)
            .bind(input.stream_id)
            .bind(input.stream_timestamp_seconds)
            .bind(added_by_user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn unlink_stream(
        pool: &PgPool,
        timestamp_id: DbId,
        stream_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM timestamp_streams WHERE timestamp_id = $1 AND stream_id = $2")
                .bind(timestamp_id)
                .bind(stream_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_streams(
        pool: &PgPool,
        timestamp_id: DbId,
    ) -> Result<Vec<TimestampStream>, sqlx::Error> {
        let query = format!(
            "SELECT {LINK_COLUMNS} FROM timestamp_streams
             WHERE timestamp_id = $1
             ORDER BY stream_timestamp_seconds ASC, id ASC"
        );
        sqlx::query_as::<_, TimestampStream>(&query)
            .bind(timestamp_id)
            .fetch_all(pool)
            .await
    }
}
