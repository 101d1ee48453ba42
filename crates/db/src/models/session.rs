//! Refresh sessions: one row per refresh token handed to a client.

use sqlx::FromRow;
use streamsource_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow)]
pub struct RefreshSession {
    pub id: DbId,
    pub user_id: DbId,
    pub token_fingerprint: String,
    /// Role the user held when the session was opened.
    pub issued_role: String,
    pub user_agent: Option<String>,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub revoke_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub struct NewRefreshSession {
    pub user_id: DbId,
    pub token_fingerprint: String,
    pub issued_role: String,
    pub user_agent: Option<String>,
    pub expires_at: Timestamp,
}

/// Why a session stopped being usable. Matches `ck_refresh_sessions_reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeReason {
    /// Exchanged for a new token pair.
    Rotated,
    Logout,
    RoleChanged,
    Deactivated,
}

impl RevokeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RevokeReason::Rotated => "rotated",
            RevokeReason::Logout => "logout",
            RevokeReason::RoleChanged => "role_changed",
            RevokeReason::Deactivated => "deactivated",
        }
    }
}
