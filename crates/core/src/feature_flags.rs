//! Feature flag names and gate evaluation.
//!
//! A flag is open for an actor when any of its gates admits them:
//!
//! 1. the boolean gate is on (open for everyone, including anonymous callers),
//! 2. the actor's user id is in the actor gate,
//! 3. the actor's role is in the group gate,
//! 4. the actor falls inside the percentage-of-actors gate.
//!
//! Percentage bucketing hashes `"{flag}:{user_id}"` so a given user stays in
//! (or out of) the rollout as the percentage grows.

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::roles::Role;
use crate::types::DbId;

/// Collaborative spreadsheet editing over WebSocket.
pub const COLLABORATIVE_EDITING: &str = "collaborative_editing";
/// Background archival of streams that stopped reporting.
pub const AUTO_ARCHIVE_STREAMS: &str = "auto_archive_streams";
/// Rejects non-admin traffic with 503 while enabled.
pub const MAINTENANCE_MODE: &str = "maintenance_mode";
/// Public account registration via `POST /auth/signup`.
pub const USER_SIGNUP: &str = "user_signup";
/// Bulk ignore-list imports.
pub const STREAM_BULK_IMPORT: &str = "stream_bulk_import";
/// Notion proxy synchronisation.
pub const NOTION_SYNC: &str = "notion_sync";

/// Flags seeded by the initial migration.
pub const KNOWN_FLAGS: &[&str] = &[
    COLLABORATIVE_EDITING,
    AUTO_ARCHIVE_STREAMS,
    MAINTENANCE_MODE,
    USER_SIGNUP,
    STREAM_BULK_IMPORT,
    NOTION_SYNC,
];

pub const MAX_FLAG_NAME_LENGTH: usize = 64;

/// The gate configuration of a single flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagGates {
    pub enabled: bool,
    pub percentage: i16,
    pub actor_ids: Vec<DbId>,
    pub groups: Vec<String>,
}

/// Evaluate whether `flag_name` is open for `actor`.
///
/// `actor` is `None` for unauthenticated callers, who only see the boolean
/// gate.
pub fn is_enabled_for(flag_name: &str, gates: &FlagGates, actor: Option<(DbId, Role)>) -> bool {
    if gates.enabled {
        return true;
    }
    let Some((user_id, role)) = actor else {
        return false;
    };
    if gates.actor_ids.contains(&user_id) {
        return true;
    }
    if gates.groups.iter().any(|g| g == role.as_str()) {
        return true;
    }
    gates.percentage > 0 && percentage_bucket(flag_name, user_id) < gates.percentage as u32
}

/// Stable bucket in `0..100` for `(flag, user)`.
pub fn percentage_bucket(flag_name: &str, user_id: DbId) -> u32 {
    let digest = Sha256::digest(format!("{flag_name}:{user_id}").as_bytes());
    let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    word % 100
}

/// Flag names are lowercase snake_case, starting with a letter.
pub fn validate_flag_name(name: &str) -> Result<(), String> {
    let pattern = Regex::new(r"^[a-z][a-z0-9_]*$").map_err(|e| e.to_string())?;
    if name.len() > MAX_FLAG_NAME_LENGTH {
        return Err(format!(
            "Flag name is too long (maximum is {MAX_FLAG_NAME_LENGTH} characters)"
        ));
    }
    if !pattern.is_match(name) {
        return Err(format!(
            "Invalid flag name '{name}'. Use lowercase letters, digits, and underscores"
        ));
    }
    Ok(())
}

pub fn validate_percentage(percentage: i16) -> Result<(), String> {
    if !(0..=100).contains(&percentage) {
        return Err(format!(
            "percentage must be between 0 and 100, got {percentage}"
        ));
    }
    Ok(())
}
