//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//!
//! Enumerated columns (status, platform, role, ...) are carried as `String`;
//! the API layer validates them against the enums in `streamsource_core`
//! before they reach a repository.

pub mod annotation;
pub mod feature_flag;
pub mod ignore_list;
pub mod location;
pub mod note;
pub mod session;
pub mod stream;
pub mod streamer;
pub mod timestamp;
pub mod user;
