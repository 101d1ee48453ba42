//! Runtime feature-flag checks against the `feature_flags` table.

use streamsource_core::error::CoreError;
use streamsource_core::feature_flags::is_enabled_for;
use streamsource_db::repositories::FeatureFlagRepo;
use streamsource_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

/// Whether `name` is open for `user`. Unknown flags are closed.
pub async fn is_enabled(pool: &DbPool, name: &str, user: Option<&AuthUser>) -> AppResult<bool> {
    let Some(flag) = FeatureFlagRepo::find_by_name(pool, name).await? else {
        return Ok(false);
    };
    let actor = user.map(|u| (u.user_id, u.role));
    Ok(is_enabled_for(&flag.name, &flag.gates(), actor))
}

/// Fail with 403 unless `name` is open for `user`.
pub async fn require(pool: &DbPool, name: &str, user: Option<&AuthUser>) -> AppResult<()> {
    if is_enabled(pool, name, user).await? {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(format!(
            "Feature '{name}' is not enabled"
        ))))
    }
}
