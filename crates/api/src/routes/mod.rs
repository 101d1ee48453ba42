pub mod admin;
pub mod annotations;
pub mod auth;
pub mod feature_flags;
pub mod health;
pub mod locations;
pub mod notes;
pub mod streamers;
pub mod streams;
pub mod timestamps;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                        WebSocket (?token=<jwt>)
/// /auth/...                  signup, login, refresh, logout, me
/// /streams/...               streams, status, pin/archive, notes
/// /streamers/...             streamers, accounts, notes
/// /annotations/...           annotations, review, stream links, notes
/// /timestamps/...            timestamps, stream links, notes
/// /notes/{id}                edit/delete a note
/// /locations/...             locations, find-or-create, validate
/// /feature-flags/{name}      flag check for the caller
/// /admin/users/...           user administration
/// /admin/ignore-lists/...    ignore lists
/// /admin/feature-flags/...   flag gates
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/streams", streams::router())
        .nest("/streamers", streamers::router())
        .nest("/annotations", annotations::router())
        .nest("/timestamps", timestamps::router())
        .nest("/notes", notes::router())
        .nest("/locations", locations::router())
        .nest("/feature-flags", feature_flags::user_router())
        .nest("/admin", admin::router())
        .nest("/admin/feature-flags", feature_flags::admin_router())
}
