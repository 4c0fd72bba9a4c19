//! Prompt version model (append-only content history).

use prompthub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::user::UserSummary;

/// A row from the `prompt_versions` table.
///
/// `content` is the prompt's content as it was *before* the edit that
/// produced this row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PromptVersion {
    pub id: DbId,
    pub prompt_id: DbId,
    pub version_number: i32,
    pub content: String,
    pub changed_by_id: Option<DbId>,
    pub change_description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A version joined with the editor's public identity.
#[derive(Debug, Clone, FromRow)]
pub struct PromptVersionWithEditor {
    #[sqlx(flatten)]
    pub version: PromptVersion,
    pub editor_username: Option<String>,
    pub editor_name: Option<String>,
}

impl PromptVersionWithEditor {
    /// `None` when the version has no editor or the editor was deleted.
    pub fn editor(&self) -> Option<UserSummary> {
        self.version.changed_by_id.map(|id| UserSummary {
            id,
            username: self.editor_username.clone(),
            name: self.editor_name.clone(),
        })
    }
}

/// Compact version listing embedded in a prompt's detail view.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PromptVersionSummary {
    pub id: DbId,
    pub version_number: i32,
    pub change_description: Option<String>,
    pub created_at: Timestamp,
}
