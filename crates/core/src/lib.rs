//! StreamSource domain layer.
//!
//! Pure domain logic with no database or HTTP dependencies: entity
//! enumerations and validation, role-based policies, feature-flag
//! evaluation, and the in-memory cell-lock broker used by collaborative
//! editing.

pub mod annotation;
pub mod collaboration;
pub mod error;
pub mod feature_flags;
pub mod ignore_list;
pub mod location;
pub mod notable;
pub mod pagination;
pub mod policy;
pub mod roles;
pub mod stream;
pub mod types;
pub mod user;
