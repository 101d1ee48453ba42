//! Handlers for the `/streams` resource.
//!
//! Besides CRUD this covers the pin/archive toggles, status reports with
//! lifecycle timestamps, and [`apply_cell_edit`], the single-column write
//! used by the collaborative spreadsheet.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use streamsource_core::collaboration::{validate_cell, EDITABLE_COLUMNS};
use streamsource_core::policy::{authorize, Action, Resource};
use streamsource_core::stream::{
    apply_status_change, detect_platform, host_of, validate_link, validate_text, Platform,
    StreamKind, StreamOrientation, StreamStatus, MAX_TEXT_FIELD_LENGTH,
};
use streamsource_core::types::DbId;
use streamsource_db::models::stream::{CreateStream, Stream, StreamFilter, UpdateStream};
use streamsource_db::repositories::{NoteRepo, StreamRepo, StreamerRepo};
use streamsource_db::DbPool;
use streamsource_events::EntityEvent;

use super::ignore_lists::blocked_link;
use super::{parse_enum, parse_optional, publish};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireEditor;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

const ENTITY: &str = "stream";

/// Body of `PATCH /streams/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Validate a link and reject it when an ignore-list entry blocks it.
async fn checked_link(pool: &DbPool, raw: &str) -> AppResult<String> {
    let link = validate_link(raw).map_err(AppError::validation)?;
    if let Some(entry) = blocked_link(pool, &link).await? {
        return Err(AppError::validation(format!(
            "Link is blocked by the {} ignore list entry '{}'",
            entry.list_type, entry.value
        )));
    }
    Ok(link)
}

fn check_text_fields(fields: &[(&str, Option<&str>)]) -> AppResult<()> {
    for (field, value) in fields {
        if let Some(v) = value {
            validate_text(field, v, MAX_TEXT_FIELD_LENGTH).map_err(AppError::validation)?;
        }
    }
    Ok(())
}

fn parse_status(value: &str) -> AppResult<StreamStatus> {
    parse_enum("status", value, StreamStatus::parse, StreamStatus::accepted)
}

/// Normalize the enumerated and bounded columns of an update in place.
fn normalize_update(input: &mut UpdateStream) -> AppResult<()> {
    check_text_fields(&[
        ("source", input.source.as_deref()),
        ("title", input.title.as_deref()),
        ("posted_by", input.posted_by.as_deref()),
        ("city", input.city.as_deref()),
        ("state", input.state.as_deref()),
    ])?;
    if let Some(source) = &input.source {
        if source.trim().is_empty() {
            return Err(AppError::validation("Source can't be blank"));
        }
    }
    input.platform = parse_optional(
        "platform",
        input.platform.as_deref(),
        Platform::parse,
        Platform::accepted,
        Platform::as_str,
    )?;
    input.kind = parse_optional(
        "kind",
        input.kind.as_deref(),
        StreamKind::parse,
        StreamKind::accepted,
        StreamKind::as_str,
    )?;
    input.orientation = parse_optional(
        "orientation",
        input.orientation.as_deref(),
        StreamOrientation::parse,
        StreamOrientation::accepted,
        StreamOrientation::as_str,
    )?;
    Ok(())
}

async fn find_stream(pool: &DbPool, id: DbId) -> AppResult<Stream> {
    StreamRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))
}

/// Persist a status report, stamping lifecycle timestamps.
async fn change_status(pool: &DbPool, stream: &Stream, next: StreamStatus) -> AppResult<Stream> {
    let current = StreamStatus::parse(&stream.status).unwrap_or(StreamStatus::Unknown);
    let stamps = apply_status_change(current, next, stream.started_at.is_some(), Utc::now());
    StreamRepo::set_status(pool, stream.id, next.as_str(), &stamps)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, stream.id))
}

/// Apply validated changes (and an optional status report) to a stream.
async fn write_update(
    pool: &DbPool,
    stream: &Stream,
    mut input: UpdateStream,
) -> AppResult<Stream> {
    if let Some(link) = input.link.take() {
        let link = checked_link(pool, &link).await?;
        if input.platform.is_none() {
            input.platform = Some(detect_platform(&link).as_str().to_string());
        }
        input.link = Some(link);
    }
    let status = input.status.take().map(|s| parse_status(&s)).transpose()?;

    let mut updated = StreamRepo::update(pool, stream.id, &input)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, stream.id))?;

    if let Some(next) = status {
        updated = change_status(pool, &updated, next).await?;
    }
    Ok(updated)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/streams
///
/// Filters: `status`, `platform`, `kind`, `is_pinned`, `is_archived`,
/// `user_id`, `streamer_id`, `search`; pagination via `limit`/`offset`;
/// ordering via `sort`. Pinned streams always come first.
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(mut filter): Query<StreamFilter>,
) -> AppResult<Json<ListResponse<Stream>>> {
    if let Some(status) = &filter.status {
        parse_status(status)?;
    }
    filter.platform = parse_optional(
        "platform",
        filter.platform.as_deref(),
        Platform::parse,
        Platform::accepted,
        Platform::as_str,
    )?;
    filter.kind = parse_optional(
        "kind",
        filter.kind.as_deref(),
        StreamKind::parse,
        StreamKind::accepted,
        StreamKind::as_str,
    )?;

    let (limit, offset) = crate::query::PaginationParams {
        limit: filter.limit,
        offset: filter.offset,
    }
    .window();

    let streams = StreamRepo::list(&state.pool, &filter).await?;
    let total = StreamRepo::count(&state.pool, &filter).await?;
    Ok(Json(ListResponse::new(streams, limit, offset, total)))
}

/// GET /api/v1/streams/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Stream>>> {
    let stream = find_stream(&state.pool, id).await?;
    Ok(Json(DataResponse { data: stream }))
}

/// POST /api/v1/streams
///
/// `platform` is detected from the link when omitted; `source` falls back to
/// the streamer's name, then to the link host.
pub async fn create(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Json(mut input): Json<CreateStream>,
) -> AppResult<(StatusCode, Json<DataResponse<Stream>>)> {
    authorize(&user.actor(), Resource::Stream, Action::Create, None)?;

    let link = checked_link(&state.pool, &input.link).await?;
    check_text_fields(&[
        ("source", input.source.as_deref()),
        ("title", input.title.as_deref()),
        ("posted_by", input.posted_by.as_deref()),
        ("city", input.city.as_deref()),
        ("state", input.state.as_deref()),
    ])?;

    let platform = match input.platform.as_deref() {
        Some(p) => parse_enum("platform", p, Platform::parse, Platform::accepted)?,
        None => detect_platform(&link),
    };
    let status = input
        .status
        .as_deref()
        .map(parse_status)
        .transpose()?
        .unwrap_or(StreamStatus::Unknown);
    let kind = input
        .kind
        .as_deref()
        .map(|k| parse_enum("kind", k, StreamKind::parse, StreamKind::accepted))
        .transpose()?
        .unwrap_or(StreamKind::Video);
    input.orientation = parse_optional(
        "orientation",
        input.orientation.as_deref(),
        StreamOrientation::parse,
        StreamOrientation::accepted,
        StreamOrientation::as_str,
    )?;

    let source = match input.source.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(source) => source.to_string(),
        None => match input.streamer_id {
            Some(streamer_id) => {
                StreamerRepo::find_by_id(&state.pool, streamer_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::validation(format!("Streamer {streamer_id} does not exist"))
                    })?
                    .name
            }
            None => host_of(&link).unwrap_or_else(|| link.clone()),
        },
    };

    input.link = link;
    input.source = Some(source);
    input.platform = Some(platform.as_str().to_string());
    input.status = Some(StreamStatus::Unknown.as_str().to_string());
    input.kind = Some(kind.as_str().to_string());

    let mut stream = StreamRepo::create(&state.pool, user.user_id, &input).await?;
    if status != StreamStatus::Unknown {
        stream = change_status(&state.pool, &stream, status).await?;
    }

    tracing::info!(user_id = user.user_id, stream_id = stream.id, platform = %stream.platform, "Stream created");
    publish(
        &state,
        EntityEvent::created(ENTITY, stream.id)
            .with_actor(user.user_id)
            .with_record(&stream),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: stream })))
}

/// PATCH /api/v1/streams/{id}
///
/// Editors may only update streams they own. A `status` in the body is
/// handled as a status report.
pub async fn update(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateStream>,
) -> AppResult<Json<DataResponse<Stream>>> {
    let stream = find_stream(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Stream, Action::Update, Some(stream.user_id))?;

    normalize_update(&mut input)?;
    let updated = write_update(&state.pool, &stream, input).await?;

    tracing::info!(user_id = user.user_id, stream_id = id, "Stream updated");
    publish(
        &state,
        EntityEvent::updated(ENTITY, id)
            .with_actor(user.user_id)
            .with_record(&updated),
    );
    Ok(Json(DataResponse { data: updated }))
}

/// PATCH /api/v1/streams/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(input): Json<StatusRequest>,
) -> AppResult<Json<DataResponse<Stream>>> {
    let next = parse_status(&input.status)?;
    let stream = find_stream(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Stream, Action::Update, Some(stream.user_id))?;

    let updated = change_status(&state.pool, &stream, next).await?;

    tracing::info!(
        user_id = user.user_id,
        stream_id = id,
        from = %stream.status,
        to = %updated.status,
        "Stream status reported"
    );
    publish(
        &state,
        EntityEvent::updated(ENTITY, id)
            .with_actor(user.user_id)
            .with_record(&updated),
    );
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/streams/{id}/pin
pub async fn pin(
    state: State<AppState>,
    user: RequireEditor,
    id: Path<DbId>,
) -> AppResult<Json<DataResponse<Stream>>> {
    set_pinned(state, user, id, true).await
}

/// POST /api/v1/streams/{id}/unpin
pub async fn unpin(
    state: State<AppState>,
    user: RequireEditor,
    id: Path<DbId>,
) -> AppResult<Json<DataResponse<Stream>>> {
    set_pinned(state, user, id, false).await
}

async fn set_pinned(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    pinned: bool,
) -> AppResult<Json<DataResponse<Stream>>> {
    let stream = find_stream(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Stream, Action::Update, Some(stream.user_id))?;
    if pinned && stream.is_archived {
        return Err(AppError::validation("Archived streams cannot be pinned"));
    }

    let updated = StreamRepo::set_pinned(&state.pool, id, pinned)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    tracing::info!(user_id = user.user_id, stream_id = id, pinned, "Stream pin toggled");
    publish(
        &state,
        EntityEvent::updated(ENTITY, id)
            .with_actor(user.user_id)
            .with_record(&updated),
    );
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/streams/{id}/archive
pub async fn archive(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Stream>>> {
    let stream = find_stream(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Stream, Action::Update, Some(stream.user_id))?;

    let archived = StreamRepo::archive(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    tracing::info!(user_id = user.user_id, stream_id = id, "Stream archived");
    publish(
        &state,
        EntityEvent::updated(ENTITY, id)
            .with_actor(user.user_id)
            .with_record(&archived),
    );
    Ok(Json(DataResponse { data: archived }))
}

/// DELETE /api/v1/streams/{id}
///
/// Also removes the stream's notes.
pub async fn delete(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let stream = find_stream(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Stream, Action::Destroy, Some(stream.user_id))?;

    NoteRepo::delete_for(&state.pool, ENTITY, id).await?;
    if !StreamRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found(ENTITY, id));
    }

    tracing::info!(user_id = user.user_id, stream_id = id, "Stream deleted");
    publish(&state, EntityEvent::deleted(ENTITY, id).with_actor(user.user_id));
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Collaborative cell edits
// ---------------------------------------------------------------------------

/// Translate a spreadsheet cell value into a stream update.
///
/// Blank values for optional text columns are stored as empty strings;
/// `source` and `link` may not be blank.
pub(crate) fn cell_update(column: &str, value: &str) -> Result<UpdateStream, String> {
    let mut update = UpdateStream::default();
    let v = Some(value.to_string());
    match column {
        "source" => update.source = v,
        "link" => update.link = v,
        "title" => update.title = v,
        "platform" => update.platform = v,
        "status" => update.status = v,
        "orientation" => update.orientation = v,
        "kind" => update.kind = v,
        "city" => update.city = v,
        "state" => update.state = v,
        "notes" => update.notes = v,
        "posted_by" => update.posted_by = v,
        other => return Err(format!("Column '{other}' is not editable")),
    }
    Ok(update)
}

/// The stored value of a spreadsheet column. Empty optional columns read as
/// an empty string.
pub(crate) fn cell_value(stream: &Stream, column: &str) -> Option<String> {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let value = match column {
        "source" => stream.source.clone(),
        "link" => stream.link.clone(),
        "title" => text(&stream.title),
        "platform" => stream.platform.clone(),
        "status" => stream.status.clone(),
        "orientation" => text(&stream.orientation),
        "kind" => stream.kind.clone(),
        "city" => text(&stream.city),
        "state" => text(&stream.state),
        "notes" => text(&stream.notes),
        "posted_by" => text(&stream.posted_by),
        _ => return None,
    };
    Some(value)
}

/// A committed spreadsheet edit.
#[derive(Debug, Clone)]
pub struct CellEdit {
    pub stream: Stream,
    /// `(column, stored value)` for the edited cell, then any other cell
    /// the write changed (a new link can change `platform`).
    pub cells: Vec<(String, String)>,
}

/// Write one spreadsheet cell through the same validation and policy as
/// `PATCH /streams/{id}`.
pub async fn apply_cell_edit(
    state: &AppState,
    user: &AuthUser,
    stream_id: DbId,
    column: &str,
    value: &str,
) -> AppResult<CellEdit> {
    validate_cell(stream_id, column).map_err(AppError::validation)?;
    let stream = find_stream(&state.pool, stream_id).await?;
    authorize(&user.actor(), Resource::Stream, Action::Update, Some(stream.user_id))?;

    let mut input = cell_update(column, value).map_err(AppError::validation)?;
    normalize_update(&mut input)?;
    let updated = write_update(&state.pool, &stream, input).await?;

    let mut cells: Vec<(String, String)> = cell_value(&updated, column)
        .map(|v| (column.to_string(), v))
        .into_iter()
        .collect();
    for other in EDITABLE_COLUMNS.iter().filter(|c| **c != column) {
        let after = cell_value(&updated, other);
        if after != cell_value(&stream, other) {
            if let Some(after) = after {
                cells.push((other.to_string(), after));
            }
        }
    }

    publish(
        state,
        EntityEvent::updated(ENTITY, stream_id)
            .with_actor(user.user_id)
            .with_record(&updated),
    );
    Ok(CellEdit {
        stream: updated,
        cells,
    })
}
