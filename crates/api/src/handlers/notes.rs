//! Handlers for polymorphic notes.
//!
//! Notes hang off streams, streamers, annotations and timestamps. The
//! per-parent routes (`/streams/{id}/notes`, ...) share [`list_for`] and
//! [`create_for`]; `/notes/{id}` edits and deletes a single note.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use streamsource_core::notable::{validate_content, NotableType};
use streamsource_core::policy::{authorize, Action, Resource};
use streamsource_core::types::DbId;
use streamsource_db::models::note::{CreateNote, Note, UpdateNote};
use streamsource_db::repositories::{AnnotationRepo, NoteRepo, StreamRepo, StreamerRepo, TimestampRepo};
use streamsource_db::DbPool;
use streamsource_events::EntityEvent;

use super::publish;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireEditor;
use crate::query::PaginationParams;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

const ENTITY: &str = "note";

/// 404 unless the record a note would attach to exists.
async fn ensure_parent(pool: &DbPool, notable_type: NotableType, id: DbId) -> AppResult<()> {
    let exists = match notable_type {
        NotableType::Stream => StreamRepo::find_by_id(pool, id).await?.is_some(),
        NotableType::Streamer => StreamerRepo::find_by_id(pool, id).await?.is_some(),
        NotableType::Annotation => AnnotationRepo::find_by_id(pool, id).await?.is_some(),
        NotableType::Timestamp => TimestampRepo::find_by_id(pool, id).await?.is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(AppError::not_found(notable_type.as_str(), id))
    }
}

async fn find_note(pool: &DbPool, id: DbId) -> AppResult<Note> {
    NoteRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))
}

/// List the notes of one record, newest first.
pub(crate) async fn list_for(
    state: &AppState,
    notable_type: NotableType,
    notable_id: DbId,
    params: &PaginationParams,
) -> AppResult<Json<ListResponse<Note>>> {
    ensure_parent(&state.pool, notable_type, notable_id).await?;
    let (limit, offset) = params.window();
    let notes =
        NoteRepo::list_for(&state.pool, notable_type.as_str(), notable_id, limit, offset).await?;
    let total = NoteRepo::count_for(&state.pool, notable_type.as_str(), notable_id).await?;
    Ok(Json(ListResponse::new(notes, limit, offset, total)))
}

/// Attach a new note to one record.
pub(crate) async fn create_for(
    state: &AppState,
    user: &AuthUser,
    notable_type: NotableType,
    notable_id: DbId,
    input: &CreateNote,
) -> AppResult<(StatusCode, Json<DataResponse<Note>>)> {
    authorize(&user.actor(), Resource::Note, Action::Create, None)?;
    validate_content(&input.content).map_err(AppError::validation)?;
    ensure_parent(&state.pool, notable_type, notable_id).await?;

    let note = NoteRepo::create(
        &state.pool,
        notable_type.as_str(),
        notable_id,
        user.user_id,
        input.content.trim(),
    )
    .await?;

    tracing::info!(
        user_id = user.user_id,
        note_id = note.id,
        notable_type = notable_type.as_str(),
        notable_id,
        "Note created"
    );
    publish(
        state,
        EntityEvent::created(ENTITY, note.id)
            .with_actor(user.user_id)
            .with_record(&note),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: note })))
}

/// GET /api/v1/streams/{id}/notes
pub async fn list_stream_notes(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ListResponse<Note>>> {
    list_for(&state, NotableType::Stream, id, &params).await
}

/// POST /api/v1/streams/{id}/notes
pub async fn create_stream_note(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(input): Json<CreateNote>,
) -> AppResult<(StatusCode, Json<DataResponse<Note>>)> {
    create_for(&state, &user, NotableType::Stream, id, &input).await
}

/// GET /api/v1/streamers/{id}/notes
pub async fn list_streamer_notes(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ListResponse<Note>>> {
    list_for(&state, NotableType::Streamer, id, &params).await
}

/// POST /api/v1/streamers/{id}/notes
pub async fn create_streamer_note(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(input): Json<CreateNote>,
) -> AppResult<(StatusCode, Json<DataResponse<Note>>)> {
    create_for(&state, &user, NotableType::Streamer, id, &input).await
}

/// GET /api/v1/annotations/{id}/notes
pub async fn list_annotation_notes(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ListResponse<Note>>> {
    list_for(&state, NotableType::Annotation, id, &params).await
}

/// POST /api/v1/annotations/{id}/notes
pub async fn create_annotation_note(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(input): Json<CreateNote>,
) -> AppResult<(StatusCode, Json<DataResponse<Note>>)> {
    create_for(&state, &user, NotableType::Annotation, id, &input).await
}

/// GET /api/v1/timestamps/{id}/notes
pub async fn list_timestamp_notes(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ListResponse<Note>>> {
    list_for(&state, NotableType::Timestamp, id, &params).await
}

/// POST /api/v1/timestamps/{id}/notes
pub async fn create_timestamp_note(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(input): Json<CreateNote>,
) -> AppResult<(StatusCode, Json<DataResponse<Note>>)> {
    create_for(&state, &user, NotableType::Timestamp, id, &input).await
}

/// PATCH /api/v1/notes/{id}
///
/// Editors may only edit their own notes.
pub async fn update(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateNote>,
) -> AppResult<Json<DataResponse<Note>>> {
    let note = find_note(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Note, Action::Update, Some(note.user_id))?;
    validate_content(&input.content).map_err(AppError::validation)?;

    let updated = NoteRepo::update(&state.pool, id, input.content.trim())
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    tracing::info!(user_id = user.user_id, note_id = id, "Note updated");
    publish(
        &state,
        EntityEvent::updated(ENTITY, id)
            .with_actor(user.user_id)
            .with_record(&updated),
    );
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/notes/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let note = find_note(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Note, Action::Destroy, Some(note.user_id))?;

    if !NoteRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found(ENTITY, id));
    }

    tracing::info!(user_id = user.user_id, note_id = id, "Note deleted");
    publish(&state, EntityEvent::deleted(ENTITY, id).with_actor(user.user_id));
    Ok(StatusCode::NO_CONTENT)
}
