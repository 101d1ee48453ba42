//! Maintenance-mode gate.

use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use streamsource_core::error::CoreError;
use streamsource_core::feature_flags::MAINTENANCE_MODE;

use super::auth::{authenticate, request_token};
use crate::error::AppError;
use crate::features;
use crate::state::AppState;

/// Paths that stay reachable during maintenance so admins can sign in.
const EXEMPT_PREFIXES: &[&str] = &["/health", "/api/v1/auth/"];

/// Reject non-admin requests with 503 while `maintenance_mode` is enabled.
pub async fn maintenance_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if EXEMPT_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return next.run(req).await;
    }

    let (parts, body) = req.into_parts();
    let user = caller(&parts, &state);

    match features::is_enabled(&state.pool, MAINTENANCE_MODE, user.as_ref()).await {
        Ok(true) if !user.as_ref().is_some_and(|u| u.role.is_admin()) => {
            tracing::debug!(path = %parts.uri.path(), "Rejected during maintenance");
            AppError::Core(CoreError::Unavailable(
                "StreamSource is down for maintenance".into(),
            ))
            .into_response()
        }
        Ok(_) => next.run(Request::from_parts(parts, body)).await,
        Err(err) => err.into_response(),
    }
}

fn caller(parts: &Parts, state: &AppState) -> Option<super::auth::AuthUser> {
    let token = request_token(parts).ok().flatten()?;
    authenticate(&token, &state.config.jwt).ok()
}
