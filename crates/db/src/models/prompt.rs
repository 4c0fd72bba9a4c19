//! Prompt entity model and DTOs.

use prompthub_core::policy::PromptAccess;
use prompthub_core::prompt::{AiProvider, PromptSort, Visibility};
use prompthub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::user::UserSummary;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `prompts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Prompt {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[sqlx(try_from = "String")]
    pub visibility: Visibility,
    #[sqlx(try_from = "String")]
    pub ai_provider: AiProvider,
    pub slug: String,
    pub usage_count: i32,
    pub like_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Prompt {
    /// The fields authorization decisions depend on.
    pub fn access(&self) -> PromptAccess {
        PromptAccess {
            owner_id: self.user_id,
            visibility: self.visibility,
        }
    }
}

/// A prompt joined with its owner's public identity.
#[derive(Debug, Clone, FromRow)]
pub struct PromptWithOwner {
    #[sqlx(flatten)]
    pub prompt: Prompt,
    pub owner_username: Option<String>,
    pub owner_name: Option<String>,
}

impl PromptWithOwner {
    pub fn owner(&self) -> UserSummary {
        UserSummary {
            id: self.prompt.user_id,
            username: self.owner_username.clone(),
            name: self.owner_name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// DTO for inserting a prompt. Field rules are checked by the caller; the
/// repository assigns the slug.
#[derive(Debug, Clone)]
pub struct CreatePrompt {
    pub user_id: DbId,
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub visibility: Visibility,
    pub ai_provider: AiProvider,
    pub tag_ids: Vec<DbId>,
}

/// DTO for editing a prompt. Only non-`None` fields are applied.
///
/// `tag_ids: Some(vec![])` clears the tag set; `None` leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdatePrompt {
    pub title: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub visibility: Option<Visibility>,
    pub ai_provider: Option<AiProvider>,
    pub tag_ids: Option<Vec<DbId>>,
    /// Recorded on the version row when the content changes.
    pub change_description: Option<String>,
}

/// Filters for prompt listings, applied on top of the viewer's scope.
#[derive(Debug, Clone, Default)]
pub struct PromptListFilter {
    pub category: Option<String>,
    pub user_id: Option<DbId>,
    pub visibility: Option<Visibility>,
    pub sort: PromptSort,
}
