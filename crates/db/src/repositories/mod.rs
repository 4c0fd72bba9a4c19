//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool`, or `&mut PgConnection` when they must join a caller's
//! transaction.

pub mod attachment_repo;
pub mod prompt_repo;
pub mod prompt_version_repo;
pub mod session_repo;
pub mod tag_repo;
pub mod user_repo;

pub use attachment_repo::AttachmentRepo;
pub use prompt_repo::{PromptRepo, PromptUpdate};
pub use prompt_version_repo::PromptVersionRepo;
pub use session_repo::SessionRepo;
pub use tag_repo::TagRepo;
pub use user_repo::UserRepo;
