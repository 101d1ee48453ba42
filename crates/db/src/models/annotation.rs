//! Annotation and annotation-stream link models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use streamsource_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

/// A row from the `annotations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Annotation {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub event_type: String,
    pub priority_level: String,
    pub review_status: String,
    pub event_timestamp: Timestamp,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tags: Vec<String>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<Timestamp>,
    pub user_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAnnotation {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `other`.
    pub event_type: Option<String>,
    /// Defaults to `medium`.
    pub priority_level: Option<String>,
    pub event_timestamp: Timestamp,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tags: Option<Vec<String>>,
}

/// DTO for updating an annotation. All fields are optional.
///
/// `review_status` is applied through
/// [`crate::repositories::AnnotationRepo::set_review_status`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAnnotation {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub priority_level: Option<String>,
    pub review_status: Option<String>,
    pub event_timestamp: Option<Timestamp>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub resolution_notes: Option<String>,
}

/// Query parameters for listing annotations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationFilter {
    pub event_type: Option<String>,
    pub priority_level: Option<String>,
    pub review_status: Option<String>,
    /// Annotations carrying this tag.
    pub tag: Option<String>,
    /// Annotations linked to this stream.
    pub stream_id: Option<DbId>,
    pub since: Option<Timestamp>,
    pub until: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---------------------------------------------------------------------------
// AnnotationStream
// ---------------------------------------------------------------------------

/// A row from the `annotation_streams` join table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnnotationStream {
    pub id: DbId,
    pub annotation_id: DbId,
    pub stream_id: DbId,
    pub stream_timestamp_seconds: i32,
    pub relevance_score: i16,
    pub stream_notes: Option<String>,
    pub added_by_user_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for linking a stream to an annotation.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkAnnotationStream {
    pub stream_id: DbId,
    /// Defaults to 0.
    pub stream_timestamp_seconds: Option<i32>,
    /// Defaults to 3.
    pub relevance_score: Option<i16>,
    pub stream_notes: Option<String>,
}
