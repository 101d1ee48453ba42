//! Route definitions for `/streams`.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{notes, streams};
use crate::state::AppState;

/// Routes mounted at `/streams`.
///
/// ```text
/// GET    /               -> list
/// POST   /               -> create
/// GET    /{id}           -> get_by_id
/// PATCH  /{id}           -> update
/// DELETE /{id}           -> delete
/// PATCH  /{id}/status    -> update_status
/// POST   /{id}/pin       -> pin
/// POST   /{id}/unpin     -> unpin
/// POST   /{id}/archive   -> archive
/// GET    /{id}/notes     -> list notes
/// POST   /{id}/notes     -> add note
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(streams::list).post(streams::create))
        .route(
            "/{id}",
            get(streams::get_by_id)
                .patch(streams::update)
                .delete(streams::delete),
        )
        .route("/{id}/status", patch(streams::update_status))
        .route("/{id}/pin", post(streams::pin))
        .route("/{id}/unpin", post(streams::unpin))
        .route("/{id}/archive", post(streams::archive))
        .route(
            "/{id}/notes",
            get(notes::list_stream_notes).post(notes::create_stream_note),
        )
}
