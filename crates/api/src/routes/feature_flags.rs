//! Route definitions for feature flags.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::feature_flags;
use crate::state::AppState;

/// Public check mounted at `/feature-flags`.
///
/// ```text
/// GET /{name}  -> check (optional auth)
/// ```
pub fn user_router() -> Router<AppState> {
    Router::new().route("/{name}", get(feature_flags::check))
}

/// Admin routes mounted at `/admin/feature-flags`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> upsert
/// GET    /{name}                    -> get
/// DELETE /{name}                    -> delete
/// POST   /{name}/enable             -> enable
/// POST   /{name}/disable            -> disable
/// PUT    /{name}/percentage         -> set_percentage
/// POST   /{name}/actors/{user_id}   -> add_actor
/// DELETE /{name}/actors/{user_id}   -> remove_actor
/// POST   /{name}/groups/{role}      -> add_group
/// DELETE /{name}/groups/{role}      -> remove_group
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(feature_flags::list).post(feature_flags::upsert))
        .route(
            "/{name}",
            get(feature_flags::get).delete(feature_flags::delete),
        )
        .route("/{name}/enable", post(feature_flags::enable))
        .route("/{name}/disable", post(feature_flags::disable))
        .route("/{name}/percentage", put(feature_flags::set_percentage))
        .route(
            "/{name}/actors/{user_id}",
            post(feature_flags::add_actor).delete(feature_flags::remove_actor),
        )
        .route(
            "/{name}/groups/{role}",
            post(feature_flags::add_group).delete(feature_flags::remove_group),
        )
}
