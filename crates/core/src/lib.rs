//! Domain logic for PromptHub.
//!
//! Everything here is free of database and HTTP dependencies so it can be
//! unit-tested directly and shared by the repository and API layers.

pub mod error;
pub mod pagination;
pub mod policy;
pub mod prompt;
pub mod roles;
pub mod slug;
pub mod storage;
pub mod tags;
pub mod types;
pub mod validation;
