//! Well-known role names and their ordering.
//!
//! These must match the `CHECK` constraint on `users.role` in
//! `20250101000001_create_users.sql`.

use serde::{Deserialize, Serialize};

pub const ROLE_DEFAULT: &str = "default";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_ADMIN: &str = "admin";

/// All assignable roles, lowest privilege first.
pub const VALID_ROLES: &[&str] = &[ROLE_DEFAULT, ROLE_EDITOR, ROLE_ADMIN];

/// A user's role. Ordered so that `Role::Admin > Role::Editor > Role::Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Default,
    Editor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Default => ROLE_DEFAULT,
            Role::Editor => ROLE_EDITOR,
            Role::Admin => ROLE_ADMIN,
        }
    }

    /// Parse a role name. Unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            ROLE_DEFAULT => Some(Role::Default),
            ROLE_EDITOR => Some(Role::Editor),
            ROLE_ADMIN => Some(Role::Admin),
            _ => None,
        }
    }

    /// Accepted role names, for validation messages.
    pub fn accepted() -> String {
        VALID_ROLES.join(", ")
    }

    /// Editors and admins may write domain records.
    pub fn can_write(self) -> bool {
        self >= Role::Editor
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_role() {
        for name in VALID_ROLES {
            let role = Role::parse(name).expect("known role");
            assert_eq!(role.as_str(), *name);
        }
    }

    #[test]
    fn parse_rejects_unknown_and_mixed_case() {
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse("moderator"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn ordering_reflects_privilege() {
        assert!(Role::Admin > Role::Editor);
        assert!(Role::Editor > Role::Default);
        assert!(!Role::Default.can_write());
        assert!(Role::Editor.can_write());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Editor.is_admin());
    }
}
