//! Admin handlers for `/admin/ignore-lists`, plus the link check used when
//! streams are created or edited.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use streamsource_core::feature_flags::STREAM_BULK_IMPORT;
use streamsource_core::ignore_list::{
    match_link, match_username, normalize_value, IgnoreEntry, IgnoreListType,
};
use streamsource_core::types::DbId;
use streamsource_db::models::ignore_list::{
    BulkIgnoreListImport, CreateIgnoreListEntry, IgnoreListCheck, IgnoreListEntry,
    IgnoreListFilter, UpdateIgnoreListEntry,
};
use streamsource_db::repositories::IgnoreListRepo;
use streamsource_db::DbPool;
use streamsource_events::EntityEvent;

use super::{parse_enum, publish};
use crate::error::{AppError, AppResult};
use crate::features;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

const ENTITY: &str = "ignore_list";

/// Maximum number of values accepted by one bulk import.
const MAX_BULK_VALUES: usize = 1000;

#[derive(Debug, Serialize)]
pub struct BulkImportResult {
    pub list_type: String,
    pub submitted: usize,
    pub inserted: usize,
    /// Values that failed normalization, with the reason.
    pub rejected: Vec<RejectedValue>,
}

#[derive(Debug, Serialize)]
pub struct RejectedValue {
    pub value: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub blocked: bool,
    pub matches: Vec<CheckMatch>,
}

#[derive(Debug, Serialize)]
pub struct CheckMatch {
    /// Which input field matched (`link`, `twitch_user`, `discord_user`).
    pub field: &'static str,
    pub list_type: String,
    pub value: String,
}

fn parse_type(value: &str) -> AppResult<IgnoreListType> {
    parse_enum(
        "list_type",
        value,
        IgnoreListType::parse,
        IgnoreListType::accepted,
    )
}

/// Load entries of the given types in matchable form.
async fn load_entries(pool: &DbPool, types: &[IgnoreListType]) -> AppResult<Vec<IgnoreEntry>> {
    let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
    let rows = IgnoreListRepo::list_by_type(pool, &names).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            IgnoreListType::parse(&row.list_type).map(|list_type| IgnoreEntry {
                list_type,
                value: row.value,
            })
        })
        .collect())
}

/// The URL or domain entry blocking `link`, if any.
pub(crate) async fn blocked_link(pool: &DbPool, link: &str) -> AppResult<Option<IgnoreEntry>> {
    let entries = load_entries(pool, &[IgnoreListType::Url, IgnoreListType::Domain]).await?;
    Ok(match_link(&entries, link).cloned())
}

/// GET /api/v1/admin/ignore-lists
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(mut filter): Query<IgnoreListFilter>,
) -> AppResult<Json<ListResponse<IgnoreListEntry>>> {
    if let Some(list_type) = &filter.list_type {
        parse_type(list_type)?;
    }
    filter.search = filter
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let (limit, offset) = PaginationParams {
        limit: filter.limit,
        offset: filter.offset,
    }
    .window();

    let entries = IgnoreListRepo::list(&state.pool, &filter, limit, offset).await?;
    let total = IgnoreListRepo::count(&state.pool, &filter).await?;
    Ok(Json(ListResponse::new(entries, limit, offset, total)))
}

/// POST /api/v1/admin/ignore-lists
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateIgnoreListEntry>,
) -> AppResult<(StatusCode, Json<DataResponse<IgnoreListEntry>>)> {
    let list_type = parse_type(&input.list_type)?;
    let value = normalize_value(list_type, &input.value).map_err(AppError::validation)?;

    let entry =
        IgnoreListRepo::create(&state.pool, list_type.as_str(), &value, input.notes.as_deref())
            .await?;

    tracing::info!(user_id = admin.user_id, entry_id = entry.id, list_type = %entry.list_type, "Ignore list entry created");
    publish(
        &state,
        EntityEvent::created(ENTITY, entry.id)
            .with_actor(admin.user_id)
            .with_record(&entry),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

/// PATCH /api/v1/admin/ignore-lists/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateIgnoreListEntry>,
) -> AppResult<Json<DataResponse<IgnoreListEntry>>> {
    let existing = IgnoreListRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    let value = match input.value.as_deref() {
        Some(raw) => {
            let list_type = parse_type(&existing.list_type)?;
            Some(normalize_value(list_type, raw).map_err(AppError::validation)?)
        }
        None => None,
    };

    let entry = IgnoreListRepo::update(&state.pool, id, value.as_deref(), input.notes.as_deref())
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    tracing::info!(user_id = admin.user_id, entry_id = id, "Ignore list entry updated");
    publish(
        &state,
        EntityEvent::updated(ENTITY, id)
            .with_actor(admin.user_id)
            .with_record(&entry),
    );
    Ok(Json(DataResponse { data: entry }))
}

/// DELETE /api/v1/admin/ignore-lists/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !IgnoreListRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found(ENTITY, id));
    }
    tracing::info!(user_id = admin.user_id, entry_id = id, "Ignore list entry deleted");
    publish(&state, EntityEvent::deleted(ENTITY, id).with_actor(admin.user_id));
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/ignore-lists/bulk
///
/// Normalizes every value, skips duplicates, and reports values that could
/// not be normalized. Requires the `stream_bulk_import` flag.
pub async fn bulk_import(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<BulkIgnoreListImport>,
) -> AppResult<Json<DataResponse<BulkImportResult>>> {
    features::require(&state.pool, STREAM_BULK_IMPORT, Some(&admin)).await?;

    let list_type = parse_type(&input.list_type)?;
    if input.values.is_empty() {
        return Err(AppError::validation("values must not be empty"));
    }
    if input.values.len() > MAX_BULK_VALUES {
        return Err(AppError::validation(format!(
            "At most {MAX_BULK_VALUES} values can be imported at once"
        )));
    }

    let (normalized, rejected) = normalize_all(list_type, &input.values);
    let entries = if normalized.is_empty() {
        Vec::new()
    } else {
        IgnoreListRepo::bulk_insert(
            &state.pool,
            list_type.as_str(),
            &normalized,
            input.notes.as_deref(),
        )
        .await?
    };
    let inserted = entries.len();
    for entry in &entries {
        publish(
            &state,
            EntityEvent::created(ENTITY, entry.id)
                .with_actor(admin.user_id)
                .with_record(entry),
        );
    }

    tracing::info!(
        user_id = admin.user_id,
        list_type = list_type.as_str(),
        submitted = input.values.len(),
        inserted,
        rejected = rejected.len(),
        "Ignore list bulk import"
    );

    Ok(Json(DataResponse {
        data: BulkImportResult {
            list_type: list_type.as_str().to_string(),
            submitted: input.values.len(),
            inserted,
            rejected,
        },
    }))
}

/// Normalize and deduplicate bulk values.
fn normalize_all(list_type: IgnoreListType, values: &[String]) -> (Vec<String>, Vec<RejectedValue>) {
    let mut normalized: Vec<String> = Vec::with_capacity(values.len());
    let mut rejected = Vec::new();
    for raw in values {
        match normalize_value(list_type, raw) {
            Ok(value) => {
                if !normalized.contains(&value) {
                    normalized.push(value);
                }
            }
            Err(error) => rejected.push(RejectedValue {
                value: raw.clone(),
                error,
            }),
        }
    }
    (normalized, rejected)
}

/// POST /api/v1/admin/ignore-lists/check
///
/// Report which entries would block the given link and usernames.
pub async fn check(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<IgnoreListCheck>,
) -> AppResult<Json<DataResponse<CheckResult>>> {
    let entries = load_entries(&state.pool, IgnoreListType::ALL).await?;
    let mut matches = Vec::new();

    if let Some(link) = input.link.as_deref() {
        if let Some(entry) = match_link(&entries, link) {
            matches.push(check_match("link", entry));
        }
    }
    for (field, list_type, username) in [
        ("twitch_user", IgnoreListType::TwitchUser, input.twitch_user.as_deref()),
        ("discord_user", IgnoreListType::DiscordUser, input.discord_user.as_deref()),
    ] {
        if let Some(entry) = username.and_then(|u| match_username(&entries, list_type, u)) {
            matches.push(check_match(field, entry));
        }
    }

    Ok(Json(DataResponse {
        data: CheckResult {
            blocked: !matches.is_empty(),
            matches,
        },
    }))
}

fn check_match(field: &'static str, entry: &IgnoreEntry) -> CheckMatch {
    CheckMatch {
        field,
        list_type: entry.list_type.as_str().to_string(),
        value: entry.value.clone(),
    }
}
