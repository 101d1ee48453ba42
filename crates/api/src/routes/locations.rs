//! Route definitions for `/locations`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::locations;
use crate::state::AppState;

/// Routes mounted at `/locations`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// POST   /find-or-create   -> find_or_create
/// POST   /validate         -> validate (no write)
/// GET    /{id}             -> get_by_id
/// PATCH  /{id}             -> update
/// DELETE /{id}             -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(locations::list).post(locations::create))
        .route("/find-or-create", post(locations::find_or_create))
        .route("/validate", post(locations::validate))
        .route(
            "/{id}",
            get(locations::get_by_id)
                .patch(locations::update)
                .delete(locations::delete),
        )
}
