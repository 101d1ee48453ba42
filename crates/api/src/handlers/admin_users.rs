//! Admin-only user management under `/admin/users`.

use axum::extract::ws::Message;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use streamsource_core::roles::Role;
use streamsource_core::types::DbId;
use streamsource_db::models::session::RevokeReason;
use streamsource_db::models::user::{UpdateUser, UserResponse};
use streamsource_db::repositories::{SessionRepo, UserRepo};
use streamsource_events::EntityEvent;

use super::{parse_enum, publish};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

const ENTITY: &str = "user";

/// Query parameters for `GET /admin/users`.
#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    pub role: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/admin/users
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<UserListParams>,
) -> AppResult<Json<ListResponse<UserResponse>>> {
    let role = params
        .role
        .as_deref()
        .map(|r| parse_enum("role", r, Role::parse, Role::accepted))
        .transpose()?;
    let role = role.map(Role::as_str);
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .window();

    let users = UserRepo::list(&state.pool, role, limit, offset).await?;
    let total = UserRepo::count(&state.pool, role).await?;
    let data = users.iter().map(UserResponse::from).collect();
    Ok(Json(ListResponse::new(data, limit, offset, total)))
}

/// PATCH /api/v1/admin/users/{id}
///
/// Changes `role` and/or `is_active`. Admins cannot demote or deactivate
/// themselves. Deactivating a user or changing their role revokes their
/// refresh sessions and closes their WebSocket connections.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateUser>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    if let Some(role) = input.role.as_deref() {
        let role = parse_enum("role", role, Role::parse, Role::accepted)?;
        if id == admin.user_id && role != Role::Admin {
            return Err(AppError::validation("You cannot change your own role"));
        }
        input.role = Some(role.as_str().to_string());
    }
    if id == admin.user_id && input.is_active == Some(false) {
        return Err(AppError::validation("You cannot deactivate your own account"));
    }

    let previous = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;
    let user = UserRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    let reason = if input.is_active == Some(false) {
        Some(RevokeReason::Deactivated)
    } else if input.role.as_deref().is_some_and(|r| r != previous.role) {
        Some(RevokeReason::RoleChanged)
    } else {
        None
    };
    if let Some(reason) = reason {
        let revoked = SessionRepo::revoke_all_for_user(&state.pool, id, reason).await?;
        let closed = state.ws_manager.send_to_user(id, Message::Close(None)).await;
        tracing::info!(
            user_id = id,
            reason = reason.as_str(),
            revoked,
            closed,
            "User sessions ended"
        );
    }

    tracing::info!(
        user_id = admin.user_id,
        target_user_id = id,
        role = %user.role,
        is_active = user.is_active,
        "User updated"
    );
    let response = UserResponse::from(&user);
    publish(
        &state,
        EntityEvent::updated(ENTITY, id)
            .with_actor(admin.user_id)
            .with_record(&response),
    );
    Ok(Json(DataResponse { data: response }))
}
