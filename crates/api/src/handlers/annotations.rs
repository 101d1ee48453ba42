//! Handlers for `/annotations`: incident markers with review workflow and
//! links to the streams that captured them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use streamsource_core::annotation::{
    normalize_tags, resolved_at_for, validate_relevance, validate_stream_offset, validate_title,
    EventType, PriorityLevel, ReviewStatus,
};
use streamsource_core::location::validate_coordinates;
use streamsource_core::policy::{authorize, Action, Resource};
use streamsource_core::types::DbId;
use streamsource_db::models::annotation::{
    Annotation, AnnotationFilter, AnnotationStream, CreateAnnotation, LinkAnnotationStream,
    UpdateAnnotation,
};
use streamsource_db::repositories::{AnnotationRepo, NoteRepo, StreamRepo};
use streamsource_db::DbPool;
use streamsource_events::EntityEvent;

use super::{parse_enum, parse_optional, publish};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireEditor;
use crate::query::PaginationParams;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

const ENTITY: &str = "annotation";
const LINK_ENTITY: &str = "annotation_stream";

/// Optional body of the resolve and dismiss actions.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequest {
    pub resolution_notes: Option<String>,
}

fn parse_review_status(value: &str) -> AppResult<ReviewStatus> {
    parse_enum(
        "review_status",
        value,
        ReviewStatus::parse,
        ReviewStatus::accepted,
    )
}

fn event_type(value: Option<&str>) -> AppResult<Option<String>> {
    parse_optional(
        "event_type",
        value,
        EventType::parse,
        EventType::accepted,
        EventType::as_str,
    )
}

fn priority_level(value: Option<&str>) -> AppResult<Option<String>> {
    parse_optional(
        "priority_level",
        value,
        PriorityLevel::parse,
        PriorityLevel::accepted,
        PriorityLevel::as_str,
    )
}

async fn find_annotation(pool: &DbPool, id: DbId) -> AppResult<Annotation> {
    AnnotationRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))
}

/// Move an annotation to `next`, keeping `resolved_at` consistent.
async fn change_review_status(
    pool: &DbPool,
    annotation: &Annotation,
    next: ReviewStatus,
    resolution_notes: Option<&str>,
) -> AppResult<Annotation> {
    let resolved_at = resolved_at_for(next, annotation.resolved_at, Utc::now());
    AnnotationRepo::set_review_status(pool, annotation.id, next.as_str(), resolved_at, resolution_notes)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, annotation.id))
}

/// GET /api/v1/annotations
///
/// Filters: `event_type`, `priority_level`, `review_status`, `tag`,
/// `stream_id`, `since`, `until`.
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(mut filter): Query<AnnotationFilter>,
) -> AppResult<Json<ListResponse<Annotation>>> {
    filter.event_type = event_type(filter.event_type.as_deref())?;
    filter.priority_level = priority_level(filter.priority_level.as_deref())?;
    filter.review_status = parse_optional(
        "review_status",
        filter.review_status.as_deref(),
        ReviewStatus::parse,
        ReviewStatus::accepted,
        ReviewStatus::as_str,
    )?;
    filter.tag = filter
        .tag
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());

    let (limit, offset) = PaginationParams {
        limit: filter.limit,
        offset: filter.offset,
    }
    .window();

    let annotations = AnnotationRepo::list(&state.pool, &filter).await?;
    let total = AnnotationRepo::count(&state.pool, &filter).await?;
    Ok(Json(ListResponse::new(annotations, limit, offset, total)))
}

/// GET /api/v1/annotations/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Annotation>>> {
    let annotation = find_annotation(&state.pool, id).await?;
    Ok(Json(DataResponse { data: annotation }))
}

/// POST /api/v1/annotations
pub async fn create(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Json(mut input): Json<CreateAnnotation>,
) -> AppResult<(StatusCode, Json<DataResponse<Annotation>>)> {
    authorize(&user.actor(), Resource::Annotation, Action::Create, None)?;
    validate_title(&input.title).map_err(AppError::validation)?;
    validate_coordinates(input.latitude, input.longitude).map_err(AppError::validation)?;

    input.title = input.title.trim().to_string();
    input.event_type = event_type(input.event_type.as_deref())?;
    input.priority_level = priority_level(input.priority_level.as_deref())?;
    input.tags = input.tags.as_deref().map(normalize_tags);

    let annotation = AnnotationRepo::create(&state.pool, user.user_id, &input).await?;

    tracing::info!(
        user_id = user.user_id,
        annotation_id = annotation.id,
        event_type = %annotation.event_type,
        priority = %annotation.priority_level,
        "Annotation created"
    );
    publish(
        &state,
        EntityEvent::created(ENTITY, annotation.id)
            .with_actor(user.user_id)
            .with_record(&annotation),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: annotation })))
}

/// PATCH /api/v1/annotations/{id}
///
/// A `review_status` in the body goes through the same transition as the
/// resolve/dismiss actions.
pub async fn update(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateAnnotation>,
) -> AppResult<Json<DataResponse<Annotation>>> {
    let annotation = find_annotation(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Annotation, Action::Update, Some(annotation.user_id))?;

    if let Some(title) = &input.title {
        validate_title(title).map_err(AppError::validation)?;
        input.title = Some(title.trim().to_string());
    }
    if input.latitude.is_some() || input.longitude.is_some() {
        validate_coordinates(
            input.latitude.or(annotation.latitude),
            input.longitude.or(annotation.longitude),
        )
        .map_err(AppError::validation)?;
    }
    input.event_type = event_type(input.event_type.as_deref())?;
    input.priority_level = priority_level(input.priority_level.as_deref())?;
    input.tags = input.tags.as_deref().map(normalize_tags);
    let review_status = input
        .review_status
        .take()
        .map(|s| parse_review_status(&s))
        .transpose()?;

    let mut updated = AnnotationRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;
    if let Some(next) = review_status {
        updated = change_review_status(&state.pool, &updated, next, None).await?;
    }

    tracing::info!(user_id = user.user_id, annotation_id = id, "Annotation updated");
    publish(
        &state,
        EntityEvent::updated(ENTITY, id)
            .with_actor(user.user_id)
            .with_record(&updated),
    );
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/annotations/{id}/resolve
pub async fn resolve(
    state: State<AppState>,
    user: RequireEditor,
    id: Path<DbId>,
    body: Option<Json<ReviewRequest>>,
) -> AppResult<Json<DataResponse<Annotation>>> {
    review(state, user, id, body, ReviewStatus::Resolved).await
}

/// POST /api/v1/annotations/{id}/dismiss
pub async fn dismiss(
    state: State<AppState>,
    user: RequireEditor,
    id: Path<DbId>,
    body: Option<Json<ReviewRequest>>,
) -> AppResult<Json<DataResponse<Annotation>>> {
    review(state, user, id, body, ReviewStatus::Dismissed).await
}

async fn review(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    body: Option<Json<ReviewRequest>>,
    next: ReviewStatus,
) -> AppResult<Json<DataResponse<Annotation>>> {
    let annotation = find_annotation(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Annotation, Action::Update, Some(annotation.user_id))?;

    let notes = body
        .and_then(|Json(b)| b.resolution_notes)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let updated = change_review_status(&state.pool, &annotation, next, notes.as_deref()).await?;

    tracing::info!(
        user_id = user.user_id,
        annotation_id = id,
        from = %annotation.review_status,
        to = next.as_str(),
        "Annotation reviewed"
    );
    publish(
        &state,
        EntityEvent::updated(ENTITY, id)
            .with_actor(user.user_id)
            .with_record(&updated),
    );
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/annotations/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let annotation = find_annotation(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Annotation, Action::Destroy, Some(annotation.user_id))?;

    NoteRepo::delete_for(&state.pool, ENTITY, id).await?;
    if !AnnotationRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found(ENTITY, id));
    }

    tracing::info!(user_id = user.user_id, annotation_id = id, "Annotation deleted");
    publish(&state, EntityEvent::deleted(ENTITY, id).with_actor(user.user_id));
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Stream links
// ---------------------------------------------------------------------------

/// GET /api/v1/annotations/{id}/streams
pub async fn list_streams(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<AnnotationStream>>>> {
    find_annotation(&state.pool, id).await?;
    let links = AnnotationRepo::list_streams(&state.pool, id).await?;
    Ok(Json(DataResponse { data: links }))
}

/// POST /api/v1/annotations/{id}/streams
///
/// Linking the same stream twice is a 409.
pub async fn link_stream(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(input): Json<LinkAnnotationStream>,
) -> AppResult<(StatusCode, Json<DataResponse<AnnotationStream>>)> {
    let annotation = find_annotation(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Annotation, Action::Update, Some(annotation.user_id))?;

    if let Some(seconds) = input.stream_timestamp_seconds {
        validate_stream_offset(seconds).map_err(AppError::validation)?;
    }
    if let Some(score) = input.relevance_score {
        validate_relevance(score).map_err(AppError::validation)?;
    }
    if StreamRepo::find_by_id(&state.pool, input.stream_id).await?.is_none() {
        return Err(AppError::validation(format!(
            "Stream {} does not exist",
            input.stream_id
        )));
    }

    let link = AnnotationRepo::link_stream(&state.pool, id, user.user_id, &input).await?;

    tracing::info!(
        user_id = user.user_id,
        annotation_id = id,
        stream_id = input.stream_id,
        relevance = link.relevance_score,
        "Stream linked to annotation"
    );
    publish(
        &state,
        EntityEvent::created(LINK_ENTITY, link.id)
            .with_actor(user.user_id)
            .with_record(&link),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: link })))
}

/// DELETE /api/v1/annotations/{id}/streams/{stream_id}
pub async fn unlink_stream(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path((id, stream_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let annotation = find_annotation(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Annotation, Action::Update, Some(annotation.user_id))?;

    if !AnnotationRepo::unlink_stream(&state.pool, id, stream_id).await? {
        return Err(AppError::not_found(LINK_ENTITY, stream_id));
    }

    tracing::info!(user_id = user.user_id, annotation_id = id, stream_id, "Stream unlinked from annotation");
    publish(
        &state,
        EntityEvent::updated(ENTITY, id).with_actor(user.user_id),
    );
    Ok(StatusCode::NO_CONTENT)
}
