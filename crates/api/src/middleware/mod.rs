//! Authentication, authorization, and maintenance-mode middleware.
//!
//! - [`auth::AuthUser`] -- the authenticated user from a Bearer token (or a
//!   `token` query parameter on WebSocket upgrades).
//! - [`rbac::RequireEditor`] / [`rbac::RequireAdmin`] -- minimum-role guards.
//! - [`maintenance::maintenance_guard`] -- 503s non-admin traffic while the
//!   `maintenance_mode` flag is on.

pub mod auth;
pub mod maintenance;
pub mod rbac;
