//! Route definitions for `/streamers`.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::{notes, streamers};
use crate::state::AppState;

/// Routes mounted at `/streamers`.
///
/// ```text
/// GET    /                              -> list
/// POST   /                              -> create
/// GET    /{id}                          -> get_by_id
/// PATCH  /{id}                          -> update
/// DELETE /{id}                          -> delete (admin)
/// GET    /{id}/accounts                 -> list_accounts
/// POST   /{id}/accounts                 -> create_account
/// PATCH  /{id}/accounts/{account_id}    -> update_account
/// DELETE /{id}/accounts/{account_id}    -> delete_account (admin)
/// GET    /{id}/notes                    -> list notes
/// POST   /{id}/notes                    -> add note
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(streamers::list).post(streamers::create))
        .route(
            "/{id}",
            get(streamers::get_by_id)
                .patch(streamers::update)
                .delete(streamers::delete),
        )
        .route(
            "/{id}/accounts",
            get(streamers::list_accounts).post(streamers::create_account),
        )
        .route(
            "/{id}/accounts/{account_id}",
            patch(streamers::update_account).delete(streamers::delete_account),
        )
        .route(
            "/{id}/notes",
            get(notes::list_streamer_notes).post(notes::create_streamer_note),
        )
}
