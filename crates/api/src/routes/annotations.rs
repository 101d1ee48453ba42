//! Route definitions for `/annotations`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{annotations, notes};
use crate::state::AppState;

/// Routes mounted at `/annotations`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /{id}                      -> get_by_id
/// PATCH  /{id}                      -> update
/// DELETE /{id}                      -> delete
/// POST   /{id}/resolve              -> resolve
/// POST   /{id}/dismiss              -> dismiss
/// GET    /{id}/streams              -> list_streams
/// POST   /{id}/streams              -> link_stream
/// DELETE /{id}/streams/{stream_id}  -> unlink_stream
/// GET    /{id}/notes                -> list notes
/// POST   /{id}/notes                -> add note
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(annotations::list).post(annotations::create))
        .route(
            "/{id}",
            get(annotations::get_by_id)
                .patch(annotations::update)
                .delete(annotations::delete),
        )
        .route("/{id}/resolve", post(annotations::resolve))
        .route("/{id}/dismiss", post(annotations::dismiss))
        .route(
            "/{id}/streams",
            get(annotations::list_streams).post(annotations::link_stream),
        )
        .route("/{id}/streams/{stream_id}", delete(annotations::unlink_stream))
        .route(
            "/{id}/notes",
            get(notes::list_annotation_notes).post(notes::create_annotation_note),
        )
}
