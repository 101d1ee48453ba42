//! Handlers for `/streamers` and their platform accounts.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use streamsource_core::policy::{authorize, Action, Resource};
use streamsource_core::stream::{validate_text, Platform};
use streamsource_core::types::DbId;
use streamsource_db::models::streamer::{
    CreateStreamer, CreateStreamerAccount, Streamer, StreamerAccount, UpdateStreamer,
    UpdateStreamerAccount,
};
use streamsource_db::repositories::{LocationRepo, NoteRepo, StreamerAccountRepo, StreamerRepo};
use streamsource_db::DbPool;
use streamsource_events::EntityEvent;

use super::{parse_enum, publish};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireEditor;
use crate::query::SearchParams;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

const ENTITY: &str = "streamer";
const ACCOUNT_ENTITY: &str = "streamer_account";

const MAX_NAME_LENGTH: usize = 100;
const MAX_USERNAME_LENGTH: usize = 100;

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name can't be blank"));
    }
    validate_text("name", name, MAX_NAME_LENGTH).map_err(AppError::validation)?;
    Ok(name.to_string())
}

fn validate_username(username: &str) -> AppResult<String> {
    let username = username.trim().trim_start_matches('@');
    if username.is_empty() {
        return Err(AppError::validation("Username can't be blank"));
    }
    validate_text("username", username, MAX_USERNAME_LENGTH).map_err(AppError::validation)?;
    Ok(username.to_string())
}

fn parse_platform(value: &str) -> AppResult<Platform> {
    parse_enum("platform", value, Platform::parse, Platform::accepted)
}

/// Public profile URL for a username on a known platform.
pub(crate) fn profile_url_for(platform: Platform, username: &str) -> Option<String> {
    let url = match platform {
        Platform::TikTok => format!("https://www.tiktok.com/@{username}"),
        Platform::Twitch => format!("https://www.twitch.tv/{username}"),
        Platform::YouTube => format!("https://www.youtube.com/@{username}"),
        Platform::Instagram => format!("https://www.instagram.com/{username}"),
        Platform::Facebook => format!("https://www.facebook.com/{username}"),
        Platform::Other => return None,
    };
    Some(url)
}

async fn ensure_location(pool: &DbPool, location_id: Option<DbId>) -> AppResult<()> {
    if let Some(id) = location_id {
        if LocationRepo::find_by_id(pool, id).await?.is_none() {
            return Err(AppError::validation(format!("Location {id} does not exist")));
        }
    }
    Ok(())
}

async fn find_streamer(pool: &DbPool, id: DbId) -> AppResult<Streamer> {
    StreamerRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))
}

// ---------------------------------------------------------------------------
// Streamers
// ---------------------------------------------------------------------------

/// GET /api/v1/streamers
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<ListResponse<Streamer>>> {
    let (limit, offset) = params.window();
    let streamers = StreamerRepo::list(&state.pool, params.term(), limit, offset).await?;
    let total = StreamerRepo::count(&state.pool, params.term()).await?;
    Ok(Json(ListResponse::new(streamers, limit, offset, total)))
}

/// GET /api/v1/streamers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Streamer>>> {
    let streamer = find_streamer(&state.pool, id).await?;
    Ok(Json(DataResponse { data: streamer }))
}

/// POST /api/v1/streamers
pub async fn create(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Json(mut input): Json<CreateStreamer>,
) -> AppResult<(StatusCode, Json<DataResponse<Streamer>>)> {
    authorize(&user.actor(), Resource::Streamer, Action::Create, None)?;
    input.name = validate_name(&input.name)?;
    ensure_location(&state.pool, input.location_id).await?;

    let streamer = StreamerRepo::create(&state.pool, user.user_id, &input).await?;

    tracing::info!(user_id = user.user_id, streamer_id = streamer.id, "Streamer created");
    publish(
        &state,
        EntityEvent::created(ENTITY, streamer.id)
            .with_actor(user.user_id)
            .with_record(&streamer),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: streamer })))
}

/// PATCH /api/v1/streamers/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateStreamer>,
) -> AppResult<Json<DataResponse<Streamer>>> {
    let streamer = find_streamer(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Streamer, Action::Update, Some(streamer.user_id))?;

    input.name = input.name.as_deref().map(validate_name).transpose()?;
    ensure_location(&state.pool, input.location_id).await?;

    let updated = StreamerRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    tracing::info!(user_id = user.user_id, streamer_id = id, "Streamer updated");
    publish(
        &state,
        EntityEvent::updated(ENTITY, id)
            .with_actor(user.user_id)
            .with_record(&updated),
    );
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/streamers/{id}
///
/// Accounts cascade in the database; streams keep their rows with the
/// streamer reference cleared. Notes are removed here.
pub async fn delete(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let streamer = find_streamer(&state.pool, id).await?;
    authorize(&user.actor(), Resource::Streamer, Action::Destroy, Some(streamer.user_id))?;

    NoteRepo::delete_for(&state.pool, ENTITY, id).await?;
    if !StreamerRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found(ENTITY, id));
    }

    tracing::info!(user_id = user.user_id, streamer_id = id, "Streamer deleted");
    publish(&state, EntityEvent::deleted(ENTITY, id).with_actor(user.user_id));
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// GET /api/v1/streamers/{id}/accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<StreamerAccount>>>> {
    find_streamer(&state.pool, id).await?;
    let accounts = StreamerAccountRepo::list_for_streamer(&state.pool, id).await?;
    Ok(Json(DataResponse { data: accounts }))
}

/// POST /api/v1/streamers/{id}/accounts
///
/// `profile_url` is derived from platform and username when omitted.
pub async fn create_account(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(mut input): Json<CreateStreamerAccount>,
) -> AppResult<(StatusCode, Json<DataResponse<StreamerAccount>>)> {
    authorize(&user.actor(), Resource::StreamerAccount, Action::Create, None)?;
    find_streamer(&state.pool, id).await?;

    let platform = parse_platform(&input.platform)?;
    input.platform = platform.as_str().to_string();
    input.username = validate_username(&input.username)?;
    input.profile_url = match input.profile_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Some(url.to_string()),
        _ => profile_url_for(platform, &input.username),
    };

    let account = StreamerAccountRepo::create(&state.pool, id, &input).await?;

    tracing::info!(
        user_id = user.user_id,
        streamer_id = id,
        account_id = account.id,
        platform = %account.platform,
        "Streamer account added"
    );
    publish(
        &state,
        EntityEvent::created(ACCOUNT_ENTITY, account.id)
            .with_actor(user.user_id)
            .with_record(&account),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: account })))
}

/// PATCH /api/v1/streamers/{id}/accounts/{account_id}
///
/// Changing platform or username re-derives the profile URL unless one is
/// supplied.
pub async fn update_account(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path((id, account_id)): Path<(DbId, DbId)>,
    Json(mut input): Json<UpdateStreamerAccount>,
) -> AppResult<Json<DataResponse<StreamerAccount>>> {
    authorize(&user.actor(), Resource::StreamerAccount, Action::Update, None)?;
    let existing = StreamerAccountRepo::find(&state.pool, id, account_id)
        .await?
        .ok_or_else(|| AppError::not_found(ACCOUNT_ENTITY, account_id))?;

    let platform = match input.platform.as_deref() {
        Some(p) => parse_platform(p)?,
        None => Platform::parse(&existing.platform).unwrap_or(Platform::Other),
    };
    input.platform = input.platform.as_ref().map(|_| platform.as_str().to_string());
    input.username = input.username.as_deref().map(validate_username).transpose()?;

    let identity_changed = input.platform.is_some() || input.username.is_some();
    if input.profile_url.is_none() && identity_changed {
        let username = input.username.as_deref().unwrap_or(&existing.username);
        input.profile_url = profile_url_for(platform, username);
    }

    let updated = StreamerAccountRepo::update(&state.pool, id, account_id, &input)
        .await?
        .ok_or_else(|| AppError::not_found(ACCOUNT_ENTITY, account_id))?;

    tracing::info!(user_id = user.user_id, streamer_id = id, account_id, "Streamer account updated");
    publish(
        &state,
        EntityEvent::updated(ACCOUNT_ENTITY, account_id)
            .with_actor(user.user_id)
            .with_record(&updated),
    );
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/streamers/{id}/accounts/{account_id}
pub async fn delete_account(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path((id, account_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let streamer = find_streamer(&state.pool, id).await?;
    authorize(&user.actor(), Resource::StreamerAccount, Action::Destroy, Some(streamer.user_id))?;

    if !StreamerAccountRepo::delete(&state.pool, id, account_id).await? {
        return Err(AppError::not_found(ACCOUNT_ENTITY, account_id));
    }

    tracing::info!(user_id = user.user_id, streamer_id = id, account_id, "Streamer account removed");
    publish(
        &state,
        EntityEvent::deleted(ACCOUNT_ENTITY, account_id).with_actor(user.user_id),
    );
    Ok(StatusCode::NO_CONTENT)
}
