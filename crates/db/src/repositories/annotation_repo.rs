//! Repository for the `annotations` and `annotation_streams` tables.

use sqlx::PgPool;
use streamsource_core::annotation::DEFAULT_RELEVANCE;
use streamsource_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use streamsource_core::types::{DbId, Timestamp};

use crate::models::annotation::{
    Annotation, AnnotationFilter, AnnotationStream, CreateAnnotation, LinkAnnotationStream,
    UpdateAnnotation,
};

const COLUMNS: &str = "id, title, description, event_type, priority_level, review_status, \
                       event_timestamp, location, latitude, longitude, tags, resolution_notes, \
                       resolved_at, user_id, created_at, updated_at";

const LINK_COLUMNS: &str = "id, annotation_id, stream_id, stream_timestamp_seconds, \
                            relevance_score, stream_notes, added_by_user_id, created_at, updated_at";

/// `WHERE` clause shared by `list` and `count`; binds `$1..=$7`.
const FILTER_CLAUSE: &str = "
    ($1::TEXT IS NULL OR event_type = $1)
    AND ($2::TEXT IS NULL OR priority_level = $2)
    AND ($3::TEXT IS NULL OR review_status = $3)
    AND ($4::TEXT IS NULL OR $4 = ANY(tags))
    AND ($5::BIGINT IS NULL OR EXISTS (
        SELECT 1 FROM annotation_streams s WHERE s.annotation_id = annotations.id AND s.stream_id = $5))
    AND ($6::TIMESTAMPTZ IS NULL OR event_timestamp >= $6)
    AND ($7::TIMESTAMPTZ IS NULL OR event_timestamp <= $7)";

pub struct AnnotationRepo;

impl AnnotationRepo {
    // -----------------------------------------------------------------------
    // Annotation CRUD
    // -----------------------------------------------------------------------

    /// Insert an annotation. `input.tags` should already be normalized.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateAnnotation,
    ) -> Result<Annotation, sqlx::Error> {
        let query = format!(
            "INSERT INTO annotations
                (title, description, event_type, priority_level, event_timestamp,
                 location, latitude, longitude, tags, user_id)
             VALUES ($1, $2, COALESCE($3, 'other'), COALESCE($4, 'medium'), $5,
                     $6, $7, $8, COALESCE($9, '{{}}'::TEXT[]), $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.event_type)
            .bind(&input.priority_level)
            .bind(input.event_timestamp)
            .bind(&input.location)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(&input.tags)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Annotation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM annotations WHERE id = $1");
        sqlx::query_as::<_, Annotation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List annotations matching `filter`, most recent event first.
    pub async fn list(
        pool: &PgPool,
        filter: &AnnotationFilter,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let limit = clamp_limit(filter.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let offset = clamp_offset(filter.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM annotations
             WHERE {FILTER_CLAUSE}
             ORDER BY event_timestamp DESC, id DESC
             LIMIT $8 OFFSET $9"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(&filter.event_type)
            .bind(&filter.priority_level)
            .bind(&filter.review_status)
            .bind(&filter.tag)
            .bind(filter.stream_id)
            .bind(filter.since)
            .bind(filter.until)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &AnnotationFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM annotations WHERE {FILTER_CLAUSE}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(&filter.event_type)
            .bind(&filter.priority_level)
            .bind(&filter.review_status)
            .bind(&filter.tag)
            .bind(filter.stream_id)
            .bind(filter.since)
            .bind(filter.until)
            .fetch_one(pool)
            .await
    }

    /// Update an annotation's descriptive fields. `review_status` is ignored.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAnnotation,
    ) -> Result<Option<Annotation>, sqlx::Error> {
        let query = format!(
            "UPDATE annotations SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                event_type = COALESCE($4, event_type),
                priority_level = COALESCE($5, priority_level),
                event_timestamp = COALESCE($6, event_timestamp),
                location = COALESCE($7, location),
                latitude = COALESCE($8, latitude),
                longitude = COALESCE($9, longitude),
                tags = COALESCE($10, tags),
                resolution_notes = COALESCE($11, resolution_notes)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.event_type)
            .bind(&input.priority_level)
            .bind(input.event_timestamp)
            .bind(&input.location)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(&input.tags)
            .bind(&input.resolution_notes)
            .fetch_optional(pool)
            .await
    }

    /// Set the review status together with its `resolved_at` stamp (computed
    /// by `streamsource_core::annotation::resolved_at_for`).
    pub async fn set_review_status(
        pool: &PgPool,
        id: DbId,
        review_status: &str,
        resolved_at: Option<Timestamp>,
        resolution_notes: Option<&str>,
    ) -> Result<Option<Annotation>, sqlx::Error> {
        let query = format!(
            "UPDATE annotations SET
                review_status = $2,
                resolved_at = $3,
                resolution_notes = COALESCE($4, resolution_notes)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(id)
            .bind(review_status)
            .bind(resolved_at)
            .bind(resolution_notes)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM annotations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Stream links
    // -----------------------------------------------------------------------

    /// Link a stream to an annotation. A duplicate pair violates
    /// `uq_annotation_streams_annotation_stream`.
    pub async fn link_stream(
        pool: &PgPool,
        annotation_id: DbId,
        added_by_user_id: DbId,
        input: &LinkAnnotationStream,
    ) -> Result<AnnotationStream, sqlx::Error> {
        let query = format!(
            "INSERT INTO annotation_streams
                (annotation_id, stream_id, stream_timestamp_seconds, relevance_score,
                 stream_notes, added_by_user_id)
             VALUES ($1, $2, COALESCE($3, 0), COALESCE($4, $5), $6, $7)
             RETURNING {LINK_COLUMNS}"
        );
        sqlx::query_as::<_, AnnotationStream>(&query)
            .bind(annotation_id)
            .bind(input.stream_id)
            .bind(input.stream_timestamp_seconds)
            .bind(input.relevance_score)
            .bind(DEFAULT_RELEVANCE)
            .bind(&input.stream_notes)
            .bind(added_by_user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn unlink_stream(
        pool: &PgPool,
        annotation_id: DbId,
        stream_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM annotation_streams WHERE annotation_id = $1 AND stream_id = $2",
        )
        .bind(annotation_id)
        .bind(stream_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Linked streams, most relevant first.
    pub async fn list_streams(
        pool: &PgPool,
        annotation_id: DbId,
    ) -> Result<Vec<AnnotationStream>, sqlx::Error> {
        let query = format!(
            "SELECT {LINK_COLUMNS} FROM annotation_streams
             WHERE annotation_id = $1
             ORDER BY relevance_score DESC, stream_timestamp_seconds ASC"
        );
        sqlx::query_as::<_, AnnotationStream>(&query)
            .bind(annotation_id)
            .fetch_all(pool)
            .await
    }
}
