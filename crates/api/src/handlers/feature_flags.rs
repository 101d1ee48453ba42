//! Feature flag handlers.
//!
//! `GET /feature-flags/{name}` answers whether a flag is open for the caller
//! (anonymous callers only see the boolean gate). Everything under
//! `/admin/feature-flags` manages the gates and is admin-only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use streamsource_core::feature_flags::{validate_flag_name, validate_percentage};
use streamsource_core::roles::Role;
use streamsource_core::types::DbId;
use streamsource_db::models::feature_flag::{FeatureFlag, SetPercentage, UpsertFeatureFlag};
use streamsource_db::repositories::{FeatureFlagRepo, UserRepo};
use streamsource_events::EntityEvent;

use super::{parse_enum, publish};
use crate::error::{AppError, AppResult};
use crate::features;
use crate::middleware::auth::MaybeAuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY: &str = "feature_flag";

#[derive(Debug, Serialize)]
pub struct FlagStatus {
    pub name: String,
    pub enabled: bool,
}

fn missing(name: &str) -> AppError {
    AppError::not_found_key(ENTITY, name)
}

/// Publish an update for a changed flag and wrap it for the response.
fn changed(state: &AppState, admin_id: DbId, flag: FeatureFlag) -> Json<DataResponse<FeatureFlag>> {
    tracing::info!(
        user_id = admin_id,
        flag = %flag.name,
        enabled = flag.enabled,
        percentage = flag.percentage,
        actors = flag.actor_ids.len(),
        groups = flag.groups.len(),
        "Feature flag changed"
    );
    publish(
        state,
        EntityEvent::updated(ENTITY, flag.id)
            .with_actor(admin_id)
            .with_record(&flag),
    );
    Json(DataResponse { data: flag })
}

/// GET /api/v1/feature-flags/{name}
pub async fn check(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(name): Path<String>,
) -> AppResult<Json<DataResponse<FlagStatus>>> {
    let enabled = features::is_enabled(&state.pool, &name, user.as_ref()).await?;
    Ok(Json(DataResponse {
        data: FlagStatus { name, enabled },
    }))
}

/// GET /api/v1/admin/feature-flags
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<FeatureFlag>>>> {
    let flags = FeatureFlagRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: flags }))
}

/// GET /api/v1/admin/feature-flags/{name}
pub async fn get(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(name): Path<String>,
) -> AppResult<Json<DataResponse<FeatureFlag>>> {
    let flag = FeatureFlagRepo::find_by_name(&state.pool, &name)
        .await?
        .ok_or_else(|| missing(&name))?;
    Ok(Json(DataResponse { data: flag }))
}

/// POST /api/v1/admin/feature-flags
///
/// Creates the flag, or updates the description and boolean gate of an
/// existing one.
pub async fn upsert(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(mut input): Json<UpsertFeatureFlag>,
) -> AppResult<Json<DataResponse<FeatureFlag>>> {
    input.name = input.name.trim().to_string();
    validate_flag_name(&input.name).map_err(AppError::validation)?;

    let flag = FeatureFlagRepo::upsert(&state.pool, &input).await?;
    Ok(changed(&state, admin.user_id, flag))
}

/// DELETE /api/v1/admin/feature-flags/{name}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(name): Path<String>,
) -> AppResult<StatusCode> {
    let flag = FeatureFlagRepo::find_by_name(&state.pool, &name)
        .await?
        .ok_or_else(|| missing(&name))?;
    if !FeatureFlagRepo::delete(&state.pool, &name).await? {
        return Err(missing(&name));
    }

    tracing::info!(user_id = admin.user_id, flag = %name, "Feature flag deleted");
    publish(&state, EntityEvent::deleted(ENTITY, flag.id).with_actor(admin.user_id));
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/feature-flags/{name}/enable
pub async fn enable(
    state: State<AppState>,
    admin: RequireAdmin,
    name: Path<String>,
) -> AppResult<Json<DataResponse<FeatureFlag>>> {
    set_enabled(state, admin, name, true).await
}

/// POST /api/v1/admin/feature-flags/{name}/disable
pub async fn disable(
    state: State<AppState>,
    admin: RequireAdmin,
    name: Path<String>,
) -> AppResult<Json<DataResponse<FeatureFlag>>> {
    set_enabled(state, admin, name, false).await
}

async fn set_enabled(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(name): Path<String>,
    enabled: bool,
) -> AppResult<Json<DataResponse<FeatureFlag>>> {
    let flag = FeatureFlagRepo::set_enabled(&state.pool, &name, enabled)
        .await?
        .ok_or_else(|| missing(&name))?;
    Ok(changed(&state, admin.user_id, flag))
}

/// PUT /api/v1/admin/feature-flags/{name}/percentage
pub async fn set_percentage(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(name): Path<String>,
    Json(input): Json<SetPercentage>,
) -> AppResult<Json<DataResponse<FeatureFlag>>> {
    validate_percentage(input.percentage).map_err(AppError::validation)?;
    let flag = FeatureFlagRepo::set_percentage(&state.pool, &name, input.percentage)
        .await?
        .ok_or_else(|| missing(&name))?;
    Ok(changed(&state, admin.user_id, flag))
}

/// POST /api/v1/admin/feature-flags/{name}/actors/{user_id}
pub async fn add_actor(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path((name, user_id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<FeatureFlag>>> {
    if UserRepo::find_by_id(&state.pool, user_id).await?.is_none() {
        return Err(AppError::not_found("user", user_id));
    }
    let flag = FeatureFlagRepo::add_actor(&state.pool, &name, user_id)
        .await?
        .ok_or_else(|| missing(&name))?;
    Ok(changed(&state, admin.user_id, flag))
}

/// DELETE /api/v1/admin/feature-flags/{name}/actors/{user_id}
pub async fn remove_actor(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path((name, user_id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<FeatureFlag>>> {
    let flag = FeatureFlagRepo::remove_actor(&state.pool, &name, user_id)
        .await?
        .ok_or_else(|| missing(&name))?;
    Ok(changed(&state, admin.user_id, flag))
}

/// POST /api/v1/admin/feature-flags/{name}/groups/{role}
///
/// Groups are role names.
pub async fn add_group(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path((name, group)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<FeatureFlag>>> {
    let role = parse_enum("group", &group, Role::parse, Role::accepted)?;
    let flag = FeatureFlagRepo::add_group(&state.pool, &name, role.as_str())
        .await?
        .ok_or_else(|| missing(&name))?;
    Ok(changed(&state, admin.user_id, flag))
}

/// DELETE /api/v1/admin/feature-flags/{name}/groups/{role}
pub async fn remove_group(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path((name, group)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<FeatureFlag>>> {
    let flag = FeatureFlagRepo::remove_group(&state.pool, &name, &group)
        .await?
        .ok_or_else(|| missing(&name))?;
    Ok(changed(&state, admin.user_id, flag))
}
