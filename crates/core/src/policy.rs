//! Per-resource authorization policies.
//!
//! Every handler that reads or mutates a domain record calls [`authorize`]
//! with the acting user, the resource kind, the action, and (for
//! ownership-sensitive actions) the id of the user who owns the record.

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// The authenticated user performing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: DbId, role: Role) -> Self {
        Self { user_id, role }
    }

    fn owns(&self, owner_id: Option<DbId>) -> bool {
        owner_id == Some(self.user_id)
    }
}

/// Resource kinds guarded by policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Stream,
    Streamer,
    StreamerAccount,
    Annotation,
    Timestamp,
    Note,
    Location,
    IgnoreList,
    FeatureFlag,
    User,
}

impl Resource {
    pub fn name(self) -> &'static str {
        match self {
            Resource::Stream => "stream",
            Resource::Streamer => "streamer",
            Resource::StreamerAccount => "streamer account",
            Resource::Annotation => "annotation",
            Resource::Timestamp => "timestamp",
            Resource::Note => "note",
            Resource::Location => "location",
            Resource::IgnoreList => "ignore list entry",
            Resource::FeatureFlag => "feature flag",
            Resource::User => "user",
        }
    }

    /// Admin-only resources reject every action from non-admins.
    fn is_admin_only(self) -> bool {
        matches!(
            self,
            Resource::IgnoreList | Resource::FeatureFlag | Resource::User
        )
    }

    /// Records whose editors may only touch rows they created.
    fn is_owner_scoped_for_update(self) -> bool {
        matches!(self, Resource::Stream | Resource::Note)
    }

    /// Records an editor may destroy when they own them.
    fn is_owner_destroyable(self) -> bool {
        matches!(
            self,
            Resource::Stream | Resource::Note | Resource::Annotation | Resource::Timestamp
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Destroy,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "delete",
        }
    }
}

/// Decide whether `actor` may perform `action` on `resource`.
///
/// `owner_id` is the `user_id` recorded on the target row, when one exists.
pub fn authorize(
    actor: &Actor,
    resource: Resource,
    action: Action,
    owner_id: Option<DbId>,
) -> Result<(), CoreError> {
    if permits(actor, resource, action, owner_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "You are not allowed to {} this {}",
            action.verb(),
            resource.name()
        )))
    }
}

/// Boolean form of [`authorize`].
pub fn permits(actor: &Actor, resource: Resource, action: Action, owner_id: Option<DbId>) -> bool {
    if actor.role.is_admin() {
        return true;
    }
    if resource.is_admin_only() {
        return false;
    }

    match action {
        Action::Read => true,
        Action::Create => actor.role.can_write(),
        Action::Update => {
            actor.role.can_write()
                && (!resource.is_owner_scoped_for_update() || actor.owns(owner_id))
        }
        Action::Destroy => {
            actor.role.can_write() && resource.is_owner_destroyable() && actor.owns(owner_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn default_user() -> Actor {
        Actor::new(1, Role::Default)
    }

    fn editor() -> Actor {
        Actor::new(2, Role::Editor)
    }

    fn admin() -> Actor {
        Actor::new(3, Role::Admin)
    }

    #[test]
    fn everyone_can_read_domain_records() {
        for actor in [default_user(), editor(), admin()] {
            assert!(permits(&actor, Resource::Stream, Action::Read, None));
            assert!(permits(&actor, Resource::Annotation, Action::Read, None));
        }
    }

    #[test]
    fn default_users_are_read_only() {
        let actor = default_user();
        assert!(!permits(&actor, Resource::Stream, Action::Create, None));
        assert!(!permits(&actor, Resource::Stream, Action::Update, Some(1)));
        assert!(!permits(&actor, Resource::Note, Action::Destroy, Some(1)));
    }

    #[test]
    fn editors_update_only_their_own_streams() {
        let actor = editor();
        assert!(permits(&actor, Resource::Stream, Action::Update, Some(2)));
        assert!(!permits(&actor, Resource::Stream, Action::Update, Some(99)));
        // Streamers are shared records.
        assert!(permits(&actor, Resource::Streamer, Action::Update, Some(99)));
    }

    #[test]
    fn editors_destroy_only_owned_destroyable_records() {
        let actor = editor();
        assert!(permits(&actor, Resource::Stream, Action::Destroy, Some(2)));
        assert!(!permits(&actor, Resource::Stream, Action::Destroy, Some(5)));
        assert!(!permits(&actor, Resource::Streamer, Action::Destroy, Some(2)));
        assert!(!permits(&actor, Resource::Location, Action::Destroy, None));
    }

    #[test]
    fn admin_only_resources_reject_editors() {
        let actor = editor();
        assert!(!permits(&actor, Resource::IgnoreList, Action::Read, None));
        assert!(!permits(&actor, Resource::FeatureFlag, Action::Update, None));
        assert!(!permits(&actor, Resource::User, Action::Read, None));
        assert!(permits(&admin(), Resource::User, Action::Update, None));
    }

    #[test]
    fn authorize_returns_forbidden_with_message() {
        let err = authorize(&default_user(), Resource::Stream, Action::Create, None);
        assert_matches!(err, Err(CoreError::Forbidden(msg)) if msg.contains("create this stream"));
    }
}
