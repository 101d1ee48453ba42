//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod annotation_repo;
pub mod feature_flag_repo;
pub mod ignore_list_repo;
pub mod location_repo;
pub mod note_repo;
pub mod session_repo;
pub mod stream_repo;
pub mod streamer_account_repo;
pub mod streamer_repo;
pub mod timestamp_repo;
pub mod user_repo;

pub use annotation_repo::AnnotationRepo;
pub use feature_flag_repo::FeatureFlagRepo;
pub use ignore_list_repo::IgnoreListRepo;
pub use location_repo::LocationRepo;
pub use note_repo::NoteRepo;
pub use session_repo::SessionRepo;
pub use stream_repo::StreamRepo;
pub use streamer_account_repo::StreamerAccountRepo;
pub use streamer_repo::StreamerRepo;
pub use timestamp_repo::TimestampRepo;
pub use user_repo::UserRepo;
