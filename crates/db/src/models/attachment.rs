//! Prompt attachment model and DTOs.

use prompthub_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `prompt_attachments` table. The blob itself lives in the
/// configured blob store under `storage_key`.
#[derive(Debug, Clone, FromRow)]
pub struct PromptAttachment {
    pub id: DbId,
    pub prompt_id: DbId,
    pub filename: String,
    pub content_type: Option<String>,
    pub byte_size: i64,
    pub storage_key: String,
    pub uploaded_by_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording an uploaded blob.
#[derive(Debug, Clone)]
pub struct CreateAttachment {
    pub prompt_id: DbId,
    pub filename: String,
    pub content_type: Option<String>,
    pub byte_size: i64,
    pub storage_key: String,
    pub uploaded_by_id: Option<DbId>,
}
