//! Handlers for `/timestamps`, lightweight time markers that can be tied to
//! offsets in one or more streams.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use streamsource_core::annotation::{validate_stream_offset, validate_title};
use streamsource_core::policy::{authorize, Action, Resource};
use streamsource_core::types::DbId;
use streamsource_db::models::timestamp::{
    CreateTimestampMarker, LinkTimestampStream, TimestampFilter, TimestampMarker, TimestampStream,
    UpdateTimestampMarker,
};
use streamsource_db::repositories::{NoteRepo, StreamRepo, TimestampRepo};
use streamsource_db::DbPool;
use streamsource_events::EntityEvent;

use super::publish;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireEditor;
use crate::query::PaginationParams;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

const ENTITY: &str = "timestamp";
const LINK_ENTITY: &str = "timestamp_stream";

async fn find_marker(pool: &DbPool, id: DbId) -> AppResult<TimestampMarker> {
    TimestampRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))
}

/// GET /api/v1/timestamps
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(mut filter): Query<TimestampFilter>,
) -> AppResult<Json<ListResponse<TimestampMarker>>> {
    filter.search = filter
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let (limit, offset) = PaginationParams {
        limit: filter.limit,
        offset: filter.offset,
    }
    .window();

    let markers = TimestampRepo::list(&state.pool, &filter).await?;
    let total = TimestampRepo::count(&state.pool, &filter).await?;
    Ok(Json(ListResponse::new(markers, limit, offset, total)))
}

/// GET /api/v1/timestamps/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TimestampMarker>>> {
    let marker = find_marker(&state.pool, id).await?;
    Ok(Json(DataResponse { data: marker }))
}

/// POST /api/v1/timestamps
pub async fn create(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Json(mut input): Json<CreateTimestampMarker>,
) -> AppResult<(StatusCode, Json<DataResponse<TimestampMarker>>)> {
    authorize(&user.actor(), Resource::Timestamp, Action::Create, None)?;
    validate_title(&input.title).map_err(AppError::validation)?;
    input.title = input.title.trim().to_string();

    let marker = TimestampRepo::create(&state.pool, user.user_id, &input).await?;

    tracing::info!(user_id = user.user_id, timestamp_id = marker.id, "Timestamp created");
    publish(
        &state,
        EntityEvent::created(ENTITY, marker.id)
            .with_actor(user.user_id)
            .with_record(&marker),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: marker })))
}

/// PATCH /api/v1/timestamps/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateTimestampMarker>,
) -> AppResult<Json<DataResponse<TimestampMarker>>> {
    let marker = find_marker(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Timestamp, Action::Update, Some(marker.user_id))?;

    if let Some(title) = &input.title {
        validate_title(title).map_err(AppError::validation)?;
        input.title = Some(title.trim().to_string());
    }

    let updated = TimestampRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    tracing::info!(user_id = user.user_id, timestamp_id = id, "Timestamp updated");
    publish(
        &state,
        EntityEvent::updated(ENTITY, id)
            .with_actor(user.user_id)
            .with_record(&updated),
    );
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/timestamps/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let marker = find_marker(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Timestamp, Action::Destroy, Some(marker.user_id))?;

    NoteRepo::delete_for(&state.pool, ENTITY, id).await?;
    if !TimestampRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found(ENTITY, id));
    }

    tracing::info!(user_id = user.user_id, timestamp_id = id, "Timestamp deleted");
    publish(&state, EntityEvent::deleted(ENTITY, id).with_actor(user.user_id));
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/timestamps/{id}/streams
pub async fn list_streams(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TimestampStream>>>> {
    find_marker(&state.pool, id).await?;
    let links = TimestampRepo::list_streams(&state.pool, id).await?;
    Ok(Json(DataResponse { data: links }))
}

/// POST /api/v1/timestamps/{id}/streams
pub async fn link_stream(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(input): Json<LinkTimestampStream>,
) -> AppResult<(StatusCode, Json<DataResponse<TimestampStream>>)> {
    let marker = find_marker(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Timestamp, Action::Update, Some(marker.user_id))?;

    if let Some(seconds) = input.stream_timestamp_seconds {
        validate_stream_offset(seconds).map_err(AppError::validation)?;
    }
    if StreamRepo::find_by_id(&state.pool, input.stream_id).await?.is_none() {
        return Err(AppError::validation(format!(
            "Stream {} does not exist",
            input.stream_id
        )));
    }

    let link = TimestampRepo::link_stream(&state.pool, id, user.user_id, &input).await?;

    tracing::info!(user_id = user.user_id, timestamp_id = id, stream_id = input.stream_id, "Stream linked to timestamp");
    publish(
        &state,
        EntityEvent::created(LINK_ENTITY, link.id)
            .with_actor(user.user_id)
            .with_record(&link),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: link })))
}

/// DELETE /api/v1/timestamps/{id}/streams/{stream_id}
pub async fn unlink_stream(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path((id, stream_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let marker = find_marker(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Timestamp, Action::Update, Some(marker.user_id))?;

    if !TimestampRepo::unlink_stream(&state.pool, id, stream_id).await? {
        return Err(AppError::not_found(LINK_ENTITY, stream_id));
    }

    tracing::info!(user_id = user.user_id, timestamp_id = id, stream_id, "Stream unlinked from timestamp");
    publish(&state, EntityEvent::updated(ENTITY, id).with_actor(user.user_id));
    Ok(StatusCode::NO_CONTENT)
}
