//! Request handlers, one submodule per resource.
//!
//! Handlers validate input against the rules in `streamsource_core`,
//! authorize through `streamsource_core::policy`, delegate persistence to the
//! repositories in `streamsource_db`, and publish an
//! [`EntityEvent`](streamsource_events::EntityEvent) after every write.

pub mod admin_users;
pub mod annotations;
pub mod auth;
pub mod feature_flags;
pub mod ignore_lists;
pub mod locations;
pub mod notes;
pub mod streamers;
pub mod streams;
pub mod timestamps;

use streamsource_core::stream::parse_field;
use streamsource_events::EntityEvent;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Parse an enum-valued field, mapping failures to a 422.
pub(crate) fn parse_enum<T>(
    field: &str,
    value: &str,
    parse: fn(&str) -> Option<T>,
    accepted: fn() -> String,
) -> AppResult<T> {
    parse_field(field, value, parse, accepted).map_err(AppError::validation)
}

/// Validate an optional enum-valued field, returning its canonical string.
pub(crate) fn parse_optional<T: Copy>(
    field: &str,
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    accepted: fn() -> String,
    as_str: fn(T) -> &'static str,
) -> AppResult<Option<String>> {
    value
        .map(|v| parse_enum(field, v, parse, accepted).map(|t| as_str(t).to_string()))
        .transpose()
}

pub(crate) fn publish(state: &AppState, event: EntityEvent) {
    state.event_bus.publish(event);
}
