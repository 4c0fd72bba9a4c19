//! Repository for the `prompt_versions` table.
//!
//! Versions are immutable snapshots appended by [`PromptRepo::update`]
//! whenever a prompt's content changes.
//!
//! [`PromptRepo::update`]: crate::repositories::PromptRepo::update

use prompthub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::prompt_version::{
    PromptVersion, PromptVersionSummary, PromptVersionWithEditor,
};

/// Column list for prompt_versions queries.
const COLUMNS: &str = "id, prompt_id, version_number, content, changed_by_id, \
                       change_description, created_at, updated_at";

/// Provides append and read operations for prompt versions.
pub struct PromptVersionRepo;

impl PromptVersionRepo {
    /// Append a snapshot at the next version number for `prompt_id`.
    ///
    /// The caller must hold the prompt row lock so concurrent appends
    /// cannot compute the same number.
    pub async fn append(
        conn: &mut PgConnection,
        prompt_id: DbId,
        content: &str,
        changed_by_id: Option<DbId>,
        change_description: Option<&str>,
    ) -> Result<PromptVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO prompt_versions \
                 (prompt_id, version_number, content, changed_by_id, change_description) \
             SELECT $1, COALESCE(MAX(version_number), 0) + 1, $2, $3, $4 \
             FROM prompt_versions WHERE prompt_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PromptVersion>(&query)
            .bind(prompt_id)
            .bind(content)
            .bind(changed_by_id)
            .bind(change_description)
            .fetch_one(&mut *conn)
            .await
    }

    /// List all versions of a prompt, newest first, with editor identity.
    pub async fn list_for_prompt(
        pool: &PgPool,
        prompt_id: DbId,
    ) -> Result<Vec<PromptVersionWithEditor>, sqlx::Error> {
        sqlx::query_as::<_, PromptVersionWithEditor>(
            "SELECT v.id, v.prompt_id, v.version_number, v.content, v.changed_by_id, \
                    v.change_description, v.created_at, v.updated_at, \
                    u.username AS editor_username, u.name AS editor_name \
             FROM prompt_versions v \
             LEFT JOIN users u ON u.id = v.changed_by_id \
             WHERE v.prompt_id = $1 \
             ORDER BY v.version_number DESC",
        )
        .bind(prompt_id)
        .fetch_all(pool)
        .await
    }

    /// Compact listing for a prompt's detail view, newest first.
    pub async fn summaries_for_prompt(
        pool: &PgPool,
        prompt_id: DbId,
    ) -> Result<Vec<PromptVersionSummary>, sqlx::Error> {
        sqlx::query_as::<_, PromptVersionSummary>(
            "SELECT id, version_number, change_description, created_at \
             FROM prompt_versions \
             WHERE prompt_id = $1 \
             ORDER BY version_number DESC",
        )
        .bind(prompt_id)
        .fetch_all(pool)
        .await
    }

    /// Find a version by id, scoped to its prompt.
    ///
    /// Returns `None` if the version belongs to a different prompt.
    pub async fn find_for_prompt(
        pool: &PgPool,
        prompt_id: DbId,
        version_id: DbId,
    ) -> Result<Option<PromptVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompt_versions WHERE id = $1 AND prompt_id = $2"
        );
        sqlx::query_as::<_, PromptVersion>(&query)
            .bind(version_id)
            .bind(prompt_id)
            .fetch_optional(pool)
            .await
    }

    /// Number of versions recorded for a prompt.
    pub async fn count_for_prompt(pool: &PgPool, prompt_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM prompt_versions WHERE prompt_id = $1")
            .bind(prompt_id)
            .fetch_one(pool)
            .await
    }
}
