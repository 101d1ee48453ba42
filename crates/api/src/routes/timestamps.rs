//! Route definitions for `/timestamps`.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::{notes, timestamps};
use crate::state::AppState;

/// Routes mounted at `/timestamps`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /{id}                      -> get_by_id
/// PATCH  /{id}                      -> update
/// DELETE /{id}                      -> delete
/// GET    /{id}/streams              -> list_streams
/// POST   /{id}/streams              -> link_stream
/// DELETE /{id}/streams/{stream_id}  -> unlink_stream
/// GET    /{id}/notes                -> list notes
/// POST   /{id}/notes                -> add note
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(timestamps::list).post(timestamps::create))
        .route(
            "/{id}",
            get(timestamps::get_by_id)
                .patch(timestamps::update)
                .delete(timestamps::delete),
        )
        .route(
            "/{id}/streams",
            get(timestamps::list_streams).post(timestamps::link_stream),
        )
        .route("/{id}/streams/{stream_id}", delete(timestamps::unlink_stream))
        .route(
            "/{id}/notes",
            get(notes::list_timestamp_notes).post(notes::create_timestamp_note),
        )
}
