//! Route definitions for `/notes`. Notes are created through their parent
//! resource's routes.

use axum::routing::patch;
use axum::Router;

use crate::handlers::notes;
use crate::state::AppState;

/// ```text
/// PATCH  /{id}  -> update
/// DELETE /{id}  -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", patch(notes::update).delete(notes::delete))
}
