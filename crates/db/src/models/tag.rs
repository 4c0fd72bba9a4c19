//! Tag and prompt-tag models.

use prompthub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub usage_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Lightweight tag info embedded in prompt responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagInfo {
    pub id: DbId,
    pub name: String,
    pub slug: String,
}

/// A tag together with the prompt it is applied to, for batch loading.
#[derive(Debug, Clone, FromRow)]
pub struct PromptTagInfo {
    pub prompt_id: DbId,
    #[sqlx(flatten)]
    pub tag: TagInfo,
}
