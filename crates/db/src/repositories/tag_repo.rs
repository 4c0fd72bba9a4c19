//! Repository for the `tags` and `prompt_tags` tables.
//!
//! Association changes keep `tags.usage_count` equal to the number of
//! prompts currently carrying the tag. They take a connection so callers
//! can run them inside the prompt's transaction.

use prompthub_core::tags::{diff_tag_sets, TagSetChange, TagSort};
use prompthub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::tag::{PromptTagInfo, Tag, TagInfo};

/// Column list for `tags` queries.
const COLUMNS: &str = "id, name, slug, usage_count, created_at, updated_at";

/// Provides tag CRUD and prompt-tag association management.
pub struct TagRepo;

impl TagRepo {
    // -----------------------------------------------------------------------
    // Tag CRUD
    // -----------------------------------------------------------------------

    /// Insert a tag. Name and slug must already be validated.
    ///
    /// A case-insensitive duplicate name fails on `uq_tags_name_lower`.
    pub async fn create(pool: &PgPool, name: &str, slug: &str) -> Result<Tag, sqlx::Error> {
        let query = format!(
            "INSERT INTO tags (name, slug) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(name)
            .bind(slug)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE id = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE slug = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Find a tag whose name matches `name` ignoring case.
    pub async fn find_by_name_ci(pool: &PgPool, name: &str) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE LOWER(name) = LOWER($1)");
        sqlx::query_as::<_, Tag>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List tags in the requested order. Limit and offset must already be clamped.
    pub async fn list(
        pool: &PgPool,
        sort: TagSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Tag>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tags ORDER BY {order} LIMIT $1 OFFSET $2",
            order = sort.order_by()
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Return the ids from `ids` that do not exist.
    pub async fn find_missing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, DbId>(
            "SELECT wanted.id FROM UNNEST($1::BIGINT[]) AS wanted(id) \
             WHERE NOT EXISTS (SELECT 1 FROM tags t WHERE t.id = wanted.id)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Prompt-tag associations
    // -----------------------------------------------------------------------

    /// Tag ids currently applied to a prompt.
    pub async fn ids_for_prompt(
        conn: &mut PgConnection,
        prompt_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT tag_id FROM prompt_tags WHERE prompt_id = $1 ORDER BY id",
        )
        .bind(prompt_id)
        .fetch_all(&mut *conn)
        .await
    }

    /// Apply a tag to a prompt. Idempotent.
    ///
    /// Increments the tag's `usage_count` only when a new association is created.
    pub async fn attach(
        conn: &mut PgConnection,
        prompt_id: DbId,
        tag_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO prompt_tags (prompt_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT (prompt_id, tag_id) DO NOTHING",
        )
        .bind(prompt_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await?;

        let was_inserted = result.rows_affected() > 0;

        if was_inserted {
            sqlx::query("UPDATE tags SET usage_count = usage_count + 1 WHERE id = $1")
                .bind(tag_id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(was_inserted)
    }

    /// Remove a tag from a prompt.
    ///
    /// Decrements the tag's `usage_count` only when an association is actually removed.
    pub async fn detach(
        conn: &mut PgConnection,
        prompt_id: DbId,
        tag_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM prompt_tags WHERE prompt_id = $1 AND tag_id = $2")
            .bind(prompt_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;

        let was_deleted = result.rows_affected() > 0;

        if was_deleted {
            sqlx::query("UPDATE tags SET usage_count = GREATEST(usage_count - 1, 0) WHERE id = $1")
                .bind(tag_id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(was_deleted)
    }

    /// Make `desired` the prompt's exact tag set.
    pub async fn set_prompt_tags(
        conn: &mut PgConnection,
        prompt_id: DbId,
        desired: &[DbId],
    ) -> Result<TagSetChange, sqlx::Error> {
        let current = Self::ids_for_prompt(&mut *conn, prompt_id).await?;
        let change = diff_tag_sets(&current, desired);

        for &tag_id in &change.to_remove {
            Self::detach(&mut *conn, prompt_id, tag_id).await?;
        }
        for &tag_id in &change.to_add {
            Self::attach(&mut *conn, prompt_id, tag_id).await?;
        }

        Ok(change)
    }

    /// Decrement counters for every tag applied to any of `prompt_ids`.
    ///
    /// Called before the prompts are deleted; the association rows go with
    /// them through the cascade.
    pub async fn release_for_prompts(
        conn: &mut PgConnection,
        prompt_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if prompt_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE tags t SET usage_count = GREATEST(t.usage_count - c.n, 0) \
             FROM ( \
                 SELECT tag_id, COUNT(*)::INTEGER AS n FROM prompt_tags \
                 WHERE prompt_id = ANY($1) GROUP BY tag_id \
             ) c \
             WHERE t.id = c.tag_id",
        )
        .bind(prompt_ids)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Tags for a single prompt, alphabetical.
    pub async fn tags_for_prompt(
        pool: &PgPool,
        prompt_id: DbId,
    ) -> Result<Vec<TagInfo>, sqlx::Error> {
        sqlx::query_as::<_, TagInfo>(
            "SELECT t.id, t.name, t.slug \
             FROM prompt_tags pt \
             JOIN tags t ON t.id = pt.tag_id \
             WHERE pt.prompt_id = $1 \
             ORDER BY t.name",
        )
        .bind(prompt_id)
        .fetch_all(pool)
        .await
    }

    /// Tags for a page of prompts in one query.
    pub async fn tags_for_prompts(
        pool: &PgPool,
        prompt_ids: &[DbId],
    ) -> Result<Vec<PromptTagInfo>, sqlx::Error> {
        if prompt_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, PromptTagInfo>(
            "SELECT pt.prompt_id, t.id, t.name, t.slug \
             FROM prompt_tags pt \
             JOIN tags t ON t.id = pt.tag_id \
             WHERE pt.prompt_id = ANY($1) \
             ORDER BY pt.prompt_id, t.name",
        )
        .bind(prompt_ids)
        .fetch_all(pool)
        .await
    }
}
