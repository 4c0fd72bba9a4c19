//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - Create DTOs for inserts and update DTOs (all `Option` fields) for patches
//! - Serializable response shapes where the row must not be exposed as-is

pub mod attachment;
pub mod prompt;
pub mod prompt_version;
pub mod session;
pub mod tag;
pub mod user;
