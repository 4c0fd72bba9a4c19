//! Repository for the `prompts` table.
//!
//! Writes run in one transaction each. Creating assigns the slug and tags.
//! Updating locks the row, appends a version when the content changes, and
//! replaces the tag set when one is given. Deleting releases tag counters.

use prompthub_core::pagination::PageRequest;
use prompthub_core::policy::VisibilityScope;
use prompthub_core::prompt::{content_changed, duplicate_title, restore_change_description};
use prompthub_core::prompt::{Visibility, DEFAULT_CHANGE_DESCRIPTION};
use prompthub_core::slug::{base_slug, candidate};
use prompthub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::prompt::{
    CreatePrompt, Prompt, PromptListFilter, PromptWithOwner, UpdatePrompt,
};
use crate::models::prompt_version::PromptVersion;
use crate::repositories::{PromptVersionRepo, TagRepo};

/// Column list for `prompts` queries.
const COLUMNS: &str = "id, user_id, title, content, description, category, visibility, \
                       ai_provider, slug, usage_count, like_count, created_at, updated_at";

/// Column list for queries that alias `prompts` as `p`.
const P_COLUMNS: &str = "p.id, p.user_id, p.title, p.content, p.description, p.category, \
                         p.visibility, p.ai_provider, p.slug, p.usage_count, p.like_count, \
                         p.created_at, p.updated_at";

/// Result of an update: the new row, plus the version appended if the
/// content changed.
#[derive(Debug, Clone)]
pub struct PromptUpdate {
    pub prompt: Prompt,
    pub version: Option<PromptVersion>,
}

/// A bound value for a dynamically built `WHERE` clause.
enum FilterArg<'a> {
    Id(DbId),
    Text(&'a str),
}

/// Provides CRUD, versioning, and listing operations for prompts.
pub struct PromptRepo;

impl PromptRepo {
    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Insert a prompt with a fresh slug and its tags.
    ///
    /// Tag ids must exist; an unknown id fails on the foreign key.
    pub async fn create(pool: &PgPool, input: &CreatePrompt) -> Result<Prompt, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let slug = Self::next_free_slug(&mut *tx, &base_slug(&input.title)).await?;

        let query = format!(
            "INSERT INTO prompts \
                 (user_id, title, content, description, category, visibility, ai_provider, slug) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        let prompt = sqlx::query_as::<_, Prompt>(&query)
            .bind(input.user_id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.description.as_deref())
            .bind(input.category.as_deref())
            .bind(input.visibility.as_str())
            .bind(input.ai_provider.as_str())
            .bind(&slug)
            .fetch_one(&mut *tx)
            .await?;

        if !input.tag_ids.is_empty() {
            TagRepo::set_prompt_tags(&mut *tx, prompt.id, &input.tag_ids).await?;
        }

        tx.commit().await?;
        Ok(prompt)
    }

    /// First of `base`, `base-1`, `base-2`, ... not taken by any prompt.
    ///
    /// `uq_prompts_slug` still guards against a concurrent insert winning
    /// the same candidate.
    async fn next_free_slug(conn: &mut PgConnection, base: &str) -> Result<String, sqlx::Error> {
        let mut attempt = 0u32;
        loop {
            let slug = candidate(base, attempt);
            let taken: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM prompts WHERE slug = $1)")
                    .bind(&slug)
                    .fetch_one(&mut *conn)
                    .await?;
            if !taken {
                return Ok(slug);
            }
            attempt += 1;
        }
    }

    /// Copy `source` into a new private prompt owned by `owner_id`.
    pub async fn duplicate(
        pool: &PgPool,
        source: &Prompt,
        owner_id: DbId,
    ) -> Result<Prompt, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        let tag_ids = TagRepo::ids_for_prompt(&mut *conn, source.id).await?;
        drop(conn);

        let input = CreatePrompt {
            user_id: owner_id,
            title: duplicate_title(&source.title),
            content: source.content.clone(),
            description: source.description.clone(),
            category: source.category.clone(),
            visibility: Visibility::Private,
            ai_provider: source.ai_provider,
            tag_ids,
        };
        Self::create(pool, &input).await
    }

    // -----------------------------------------------------------------------
    // Read
    // -----------------------------------------------------------------------

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prompts WHERE id = $1");
        sqlx::query_as::<_, Prompt>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prompts WHERE slug = $1");
        sqlx::query_as::<_, Prompt>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Resolve a path segment: numeric keys are tried as an id first, then
    /// every key is tried as a slug.
    pub async fn find_by_id_or_slug(
        pool: &PgPool,
        key: &str,
    ) -> Result<Option<Prompt>, sqlx::Error> {
        if let Ok(id) = key.parse::<DbId>() {
            if let Some(prompt) = Self::find_by_id(pool, id).await? {
                return Ok(Some(prompt));
            }
        }
        Self::find_by_slug(pool, key).await
    }

    /// Find a prompt joined with its owner.
    pub async fn find_with_owner(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PromptWithOwner>, sqlx::Error> {
        let query = format!(
            "SELECT {P_COLUMNS}, u.username AS owner_username, u.name AS owner_name \
             FROM prompts p \
             JOIN users u ON u.id = p.user_id \
             WHERE p.id = $1"
        );
        sqlx::query_as::<_, PromptWithOwner>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of prompts inside `scope`, filtered and sorted.
    pub async fn list(
        pool: &PgPool,
        scope: VisibilityScope,
        filter: &PromptListFilter,
        page: PageRequest,
    ) -> Result<Vec<PromptWithOwner>, sqlx::Error> {
        let (where_clause, args) = build_filter(&scope, filter);
        let bind_idx = args.len() + 1;

        let query = format!(
            "SELECT {P_COLUMNS}, u.username AS owner_username, u.name AS owner_name \
             FROM prompts p \
             JOIN users u ON u.id = p.user_id \
             {where_clause} \
             ORDER BY {order} \
             LIMIT ${bind_idx} OFFSET ${next_idx}",
            order = filter.sort.order_by(),
            next_idx = bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, PromptWithOwner>(&query);
        for arg in &args {
            q = match arg {
                FilterArg::Id(v) => q.bind(*v),
                FilterArg::Text(v) => q.bind(*v),
            };
        }
        q.bind(page.limit()).bind(page.offset()).fetch_all(pool).await
    }

    /// Total number of prompts matching `scope` and `filter`.
    pub async fn count(
        pool: &PgPool,
        scope: VisibilityScope,
        filter: &PromptListFilter,
    ) -> Result<i64, sqlx::Error> {
        let (where_clause, args) = build_filter(&scope, filter);
        let query = format!("SELECT COUNT(*) FROM prompts p {where_clause}");

        let mut q = sqlx::query_scalar::<_, i64>(&query);
        for arg in &args {
            q = match arg {
                FilterArg::Id(v) => q.bind(*v),
                FilterArg::Text(v) => q.bind(*v),
            };
        }
        q.fetch_one(pool).await
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    /// Apply `input` to a prompt.
    ///
    /// When the content changes, the previous content is appended as a new
    /// version in the same transaction. Returns `None` if the prompt does
    /// not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePrompt,
        editor_id: Option<DbId>,
    ) -> Result<Option<PromptUpdate>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let lock = format!("SELECT {COLUMNS} FROM prompts WHERE id = $1 FOR UPDATE");
        let Some(current) = sqlx::query_as::<_, Prompt>(&lock)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let version = if content_changed(&current.content, input.content.as_deref()) {
            let description = input
                .change_description
                .as_deref()
                .unwrap_or(DEFAULT_CHANGE_DESCRIPTION);
            Some(
                PromptVersionRepo::append(
                    &mut *tx,
                    id,
                    &current.content,
                    editor_id,
                    Some(description),
                )
                .await?,
            )
        } else {
            None
        };

        let query = format!(
            "UPDATE prompts SET \
                 title = COALESCE($2, title), \
                 content = COALESCE($3, content), \
                 description = COALESCE($4, description), \
                 category = COALESCE($5, category), \
                 visibility = COALESCE($6, visibility), \
                 ai_provider = COALESCE($7, ai_provider) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let prompt = sqlx::query_as::<_, Prompt>(&query)
            .bind(id)
            .bind(input.title.as_deref())
            .bind(input.content.as_deref())
            .bind(input.description.as_deref())
            .bind(input.category.as_deref())
            .bind(input.visibility.map(|v| v.as_str()))
            .bind(input.ai_provider.map(|p| p.as_str()))
            .fetch_one(&mut *tx)
            .await?;

        if let Some(tag_ids) = &input.tag_ids {
            TagRepo::set_prompt_tags(&mut *tx, id, tag_ids).await?;
        }

        tx.commit().await?;
        Ok(Some(PromptUpdate { prompt, version }))
    }

    /// Copy `version`'s content back onto its prompt as a regular content
    /// update, so the content being replaced is itself versioned.
    pub async fn restore_version(
        pool: &PgPool,
        version: &PromptVersion,
        editor_id: Option<DbId>,
    ) -> Result<Option<PromptUpdate>, sqlx::Error> {
        let input = UpdatePrompt {
            content: Some(version.content.clone()),
            change_description: Some(restore_change_description(version.version_number)),
            ..Default::default()
        };
        Self::update(pool, version.prompt_id, &input, editor_id).await
    }

    /// Atomically bump `usage_count`. Returns the new value, or `None` if
    /// the prompt does not exist.
    pub async fn increment_usage(pool: &PgPool, id: DbId) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE prompts SET usage_count = usage_count + 1 WHERE id = $1 RETURNING usage_count",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Delete a prompt with its versions, tag associations, and attachment rows.
    ///
    /// Returns the storage keys of the removed attachments so the caller can
    /// delete the blobs once the transaction has committed, or `None` if the
    /// prompt does not exist.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked = sqlx::query_scalar::<_, DbId>("SELECT id FROM prompts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }

        TagRepo::release_for_prompts(&mut *tx, &[id]).await?;

        let keys = sqlx::query_scalar::<_, String>(
            "DELETE FROM prompt_attachments WHERE prompt_id = $1 RETURNING storage_key",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM prompts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(keys))
    }
}

/// Build the `WHERE` clause for a listing and the values to bind, in order,
/// starting at `$1`.
fn build_filter<'a>(
    scope: &VisibilityScope,
    filter: &'a PromptListFilter,
) -> (String, Vec<FilterArg<'a>>) {
    let mut conditions = Vec::new();
    let mut args = Vec::new();
    let mut bind_idx = 1usize;

    match scope {
        VisibilityScope::All => {}
        VisibilityScope::Member { user_id } => {
            conditions.push(format!(
                "(p.visibility IN (${bind_idx}, ${next}) OR p.user_id = ${last})",
                next = bind_idx + 1,
                last = bind_idx + 2,
            ));
            args.push(FilterArg::Text(Visibility::Public.as_str()));
            args.push(FilterArg::Text(Visibility::Team.as_str()));
            args.push(FilterArg::Id(*user_id));
            bind_idx += 3;
        }
        VisibilityScope::PublicOnly => {
            conditions.push(format!("p.visibility = ${bind_idx}"));
            args.push(FilterArg::Text(Visibility::Public.as_str()));
            bind_idx += 1;
        }
    }

    if let Some(category) = filter.category.as_deref() {
        conditions.push(format!("p.category = ${bind_idx}"));
        args.push(FilterArg::Text(category));
        bind_idx += 1;
    }
    if let Some(user_id) = filter.user_id {
        conditions.push(format!("p.user_id = ${bind_idx}"));
        args.push(FilterArg::Id(user_id));
        bind_idx += 1;
    }
    if let Some(visibility) = filter.visibility {
        conditions.push(format!("p.visibility = ${bind_idx}"));
        args.push(FilterArg::Text(visibility.as_str()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (where_clause, args)
}
