//! Route definitions for the `/admin` resource (admin only).

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{admin_users, ignore_lists};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /users                 -> list users
/// PATCH  /users/{id}            -> update role / is_active
/// GET    /ignore-lists          -> list entries
/// POST   /ignore-lists          -> create entry
/// POST   /ignore-lists/bulk     -> bulk_import (stream_bulk_import flag)
/// POST   /ignore-lists/check    -> check link/usernames
/// PATCH  /ignore-lists/{id}     -> update entry
/// DELETE /ignore-lists/{id}     -> delete entry
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin_users::list))
        .route("/users/{id}", patch(admin_users::update))
        .route(
            "/ignore-lists",
            get(ignore_lists::list).post(ignore_lists::create),
        )
        .route("/ignore-lists/bulk", post(ignore_lists::bulk_import))
        .route("/ignore-lists/check", post(ignore_lists::check))
        .route(
            "/ignore-lists/{id}",
            patch(ignore_lists::update).delete(ignore_lists::delete),
        )
}
