//! Repository for the `prompt_attachments` table.

use prompthub_core::types::DbId;
use sqlx::PgPool;

use crate::models::attachment::{CreateAttachment, PromptAttachment};

/// Column list for prompt_attachments queries.
const COLUMNS: &str = "id, prompt_id, filename, content_type, byte_size, storage_key, \
                       uploaded_by_id, created_at, updated_at";

/// Provides create, list, and delete for attachment records.
pub struct AttachmentRepo;

impl AttachmentRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateAttachment,
    ) -> Result<PromptAttachment, sqlx::Error> {
        let query = format!(
            "INSERT INTO prompt_attachments \
                 (prompt_id, filename, content_type, byte_size, storage_key, uploaded_by_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PromptAttachment>(&query)
            .bind(input.prompt_id)
            .bind(&input.filename)
            .bind(input.content_type.as_deref())
            .bind(input.byte_size)
            .bind(&input.storage_key)
            .bind(input.uploaded_by_id)
            .fetch_one(pool)
            .await
    }

    /// Attachments of one prompt, oldest first.
    pub async fn list_for_prompt(
        pool: &PgPool,
        prompt_id: DbId,
    ) -> Result<Vec<PromptAttachment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompt_attachments WHERE prompt_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, PromptAttachment>(&query)
            .bind(prompt_id)
            .fetch_all(pool)
            .await
    }

    /// Attachments for a page of prompts in one query.
    pub async fn list_for_prompts(
        pool: &PgPool,
        prompt_ids: &[DbId],
    ) -> Result<Vec<PromptAttachment>, sqlx::Error> {
        if prompt_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM prompt_attachments \
             WHERE prompt_id = ANY($1) ORDER BY prompt_id, id"
        );
        sqlx::query_as::<_, PromptAttachment>(&query)
            .bind(prompt_ids)
            .fetch_all(pool)
            .await
    }

    /// Delete an attachment belonging to `prompt_id`.
    ///
    /// Returns the deleted row (for blob cleanup), or `None` if no such
    /// attachment exists on that prompt.
    pub async fn delete_for_prompt(
        pool: &PgPool,
        prompt_id: DbId,
        attachment_id: DbId,
    ) -> Result<Option<PromptAttachment>, sqlx::Error> {
        let query = format!(
            "DELETE FROM prompt_attachments WHERE id = $1 AND prompt_id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PromptAttachment>(&query)
            .bind(attachment_id)
            .bind(prompt_id)
            .fetch_optional(pool)
            .await
    }
}
