//! JWT-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use streamsource_core::error::CoreError;
use streamsource_core::policy::Actor;
use streamsource_core::roles::Role;
use streamsource_core::types::DbId;

use crate::auth::jwt::{JwtConfig, TokenError};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the request.
///
/// The token is read from `Authorization: Bearer <token>`. Browsers cannot
/// set headers on WebSocket upgrades, so a `?token=<jwt>` query parameter is
/// accepted as a fallback.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: DbId,
    pub role: Role,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = request_token(parts)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;
        authenticate(&token, &state.config.jwt)
    }
}

/// Like [`AuthUser`], but anonymous requests are allowed through as `None`.
///
/// A token that is present but invalid is still rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match request_token(parts)? {
            Some(token) => Ok(MaybeAuthUser(Some(authenticate(&token, &state.config.jwt)?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}

/// Decode a token into an [`AuthUser`].
pub fn authenticate(token: &str, config: &JwtConfig) -> Result<AuthUser, AppError> {
    let claims = config.verify_access_token(token).map_err(|e| {
        let message = match e {
            TokenError::Expired => "Token has expired",
            TokenError::Invalid(_) | TokenError::Signing(_) => "Invalid token",
        };
        AppError::Core(CoreError::Unauthorized(message.into()))
    })?;
    Ok(AuthUser {
        user_id: claims.sub,
        role: claims.role,
    })
}

/// The raw token from the request, if one was supplied.
pub(crate) fn request_token(parts: &Parts) -> Result<Option<String>, AppError> {
    if let Some(header) = parts.headers.get("authorization") {
        let value = header.to_str().map_err(|_| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization header".into(),
            ))
        })?;
        let token = value.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;
        return Ok(Some(token.trim().to_string()));
    }
    Ok(query_token(parts.uri.query()))
}

fn query_token(query: Option<&str>) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "token")
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
