//! Handlers for the `/prompts` resource.
//!
//! Every handler resolves the acting viewer, loads the prompt by id or slug,
//! and asks the policy module before touching the store. Listings are
//! restricted to the viewer's visibility scope before any filter applies.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use prompthub_core::error::CoreError;
use prompthub_core::pagination::{PageMeta, PageRequest};
use prompthub_core::policy::{ensure_prompt, resolve_scope, PromptAction, Viewer};
use prompthub_core::prompt::{AiProvider, PromptSort, Visibility};
use prompthub_core::tags::dedup_ids;
use prompthub_core::types::DbId;
use prompthub_core::validation::{self, FieldErrors};
use prompthub_db::models::prompt::{
    CreatePrompt, Prompt, PromptListFilter, PromptWithOwner, UpdatePrompt,
};
use prompthub_db::models::prompt_version::PromptVersionSummary;
use prompthub_db::models::tag::TagInfo;
use prompthub_db::models::user::UserSummary;
use prompthub_db::repositories::{AttachmentRepo, PromptRepo, PromptVersionRepo, TagRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::attachments::{attachment_response, remove_blobs, AttachmentResponse};
use crate::middleware::auth::{AuthUser, CurrentViewer};
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

const NOT_IN_LIST: &str = "is not included in the list";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListPromptsQuery {
    pub category: Option<String>,
    pub user_id: Option<DbId>,
    pub visibility: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Request body for `POST /prompts`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePromptRequest {
    #[validate(length(min = 3, max = 200, message = "must be between 3 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 10, max = 10000, message = "must be between 10 and 10000 characters"))]
    pub content: String,
    #[validate(length(max = 500, message = "is too long (maximum is 500 characters)"))]
    pub description: Option<String>,
    #[validate(length(max = 50, message = "is too long (maximum is 50 characters)"))]
    pub category: Option<String>,
    pub visibility: Option<String>,
    pub ai_provider: Option<String>,
    pub tag_ids: Option<Vec<DbId>>,
}

/// Request body for `PUT/PATCH /prompts/{id_or_slug}`. Absent fields are left
/// unchanged; `tag_ids` replaces the whole set when present.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePromptRequest {
    #[validate(length(min = 3, max = 200, message = "must be between 3 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 10000, message = "must be between 10 and 10000 characters"))]
    pub content: Option<String>,
    #[validate(length(max = 500, message = "is too long (maximum is 500 characters)"))]
    pub description: Option<String>,
    #[validate(length(max = 50, message = "is too long (maximum is 50 characters)"))]
    pub category: Option<String>,
    pub visibility: Option<String>,
    pub ai_provider: Option<String>,
    pub tag_ids: Option<Vec<DbId>>,
    #[validate(length(max = 500, message = "is too long (maximum is 500 characters)"))]
    pub change_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestoreVersionRequest {
    pub version_id: DbId,
}

/// A prompt with its owner, tags, and attachments. `versions` is included
/// on the detail view only.
#[derive(Debug, Serialize)]
pub struct PromptResponse {
    #[serde(flatten)]
    pub prompt: Prompt,
    pub owner: UserSummary,
    pub tags: Vec<TagInfo>,
    pub attachments: Vec<AttachmentResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<PromptVersionSummary>>,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub id: DbId,
    pub version_number: i32,
    pub content: String,
    pub change_description: Option<String>,
    pub changed_by: Option<UserSummary>,
    pub created_at: prompthub_core::types::Timestamp,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub usage_count: i32,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/prompts
pub async fn list(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Query(params): Query<ListPromptsQuery>,
) -> AppResult<Json<PaginatedResponse<PromptResponse>>> {
    ensure_prompt(&viewer, PromptAction::Index, None)?;

    let visibility = params
        .visibility
        .as_deref()
        .map(Visibility::from_str)
        .transpose()?;

    let filter = PromptListFilter {
        category: params.category.filter(|c| !c.is_empty()),
        user_id: params.user_id,
        visibility,
        sort: PromptSort::from_param(params.sort.as_deref()),
    };
    let page = PageRequest::new(params.page, params.per_page);
    let scope = resolve_scope(&viewer);

    let rows = PromptRepo::list(&state.pool, scope, &filter, page).await?;
    let total = PromptRepo::count(&state.pool, scope, &filter).await?;
    let data = assemble_many(&state, rows).await?;

    Ok(Json(PaginatedResponse {
        data,
        meta: PageMeta::new(page, total),
    }))
}

/// GET /api/v1/prompts/{id_or_slug}
pub async fn show(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<PromptResponse>>> {
    let prompt = find_prompt(&state, &key).await?;
    ensure_prompt(&viewer, PromptAction::Show, Some(&prompt.access()))?;

    let data = assemble_detail(&state, prompt.id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/prompts
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut input): Json<CreatePromptRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<PromptResponse>>)> {
    let viewer = auth.viewer();
    ensure_prompt(&viewer, PromptAction::Create, None)?;

    // Length rules apply to the stored, trimmed title.
    input.title = input.title.trim().to_string();
    let mut errors = validation::check(&input);
    validation::require_present(&mut errors, "title", &input.title);
    validation::require_present(&mut errors, "content", &input.content);
    let visibility = parse_choice::<Visibility>(&mut errors, "visibility", &input.visibility);
    let ai_provider = parse_choice::<AiProvider>(&mut errors, "ai_provider", &input.ai_provider);
    let tag_ids = check_tag_ids(&state, &mut errors, input.tag_ids.as_deref()).await?;
    errors.into_result()?;

    let create = CreatePrompt {
        user_id: auth.user_id,
        title: input.title,
        content: input.content,
        description: input.description,
        category: input.category,
        visibility: visibility.unwrap_or_default(),
        ai_provider: ai_provider.unwrap_or_default(),
        tag_ids: tag_ids.unwrap_or_default(),
    };

    let prompt = PromptRepo::create(&state.pool, &create).await?;
    tracing::info!(prompt_id = prompt.id, slug = %prompt.slug, user_id = auth.user_id, "Prompt created");

    let data = assemble_detail(&state, prompt.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// PUT/PATCH /api/v1/prompts/{id_or_slug}
///
/// A content change appends a version holding the previous content.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
    Json(mut input): Json<UpdatePromptRequest>,
) -> AppResult<Json<DataResponse<PromptResponse>>> {
    let viewer = auth.viewer();
    let prompt = find_prompt(&state, &key).await?;
    ensure_prompt(&viewer, PromptAction::Update, Some(&prompt.access()))?;

    input.title = input.title.map(|t| t.trim().to_string());
    let mut errors = validation::check(&input);
    if let Some(title) = &input.title {
        validation::require_present(&mut errors, "title", title);
    }
    if let Some(content) = &input.content {
        validation::require_present(&mut errors, "content", content);
    }
    let visibility = parse_choice::<Visibility>(&mut errors, "visibility", &input.visibility);
    let ai_provider = parse_choice::<AiProvider>(&mut errors, "ai_provider", &input.ai_provider);
    let tag_ids = check_tag_ids(&state, &mut errors, input.tag_ids.as_deref()).await?;
    errors.into_result()?;

    let changes = UpdatePrompt {
        title: input.title,
        content: input.content,
        description: input.description,
        category: input.category,
        visibility,
        ai_provider,
        tag_ids,
        change_description: input.change_description.filter(|d| !d.trim().is_empty()),
    };

    let updated = PromptRepo::update(&state.pool, prompt.id, &changes, viewer.user_id())
        .await?
        .ok_or_else(|| not_found(&key))?;

    tracing::info!(
        prompt_id = prompt.id,
        user_id = auth.user_id,
        version = updated.version.as_ref().map(|v| v.version_number),
        "Prompt updated"
    );

    let data = assemble_detail(&state, prompt.id).await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/prompts/{id_or_slug}
///
/// Versions and tag links go with the prompt (tag counters are released);
/// attachment files are removed after the rows are gone.
pub async fn destroy(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    let prompt = find_prompt(&state, &key).await?;
    ensure_prompt(&auth.viewer(), PromptAction::Destroy, Some(&prompt.access()))?;

    let keys = PromptRepo::delete(&state.pool, prompt.id)
        .await?
        .ok_or_else(|| not_found(&key))?;

    remove_blobs(&state, &keys).await;

    tracing::info!(prompt_id = prompt.id, user_id = auth.user_id, "Prompt deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/prompts/{id_or_slug}/versions
pub async fn versions(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<Vec<VersionResponse>>>> {
    let prompt = find_prompt(&state, &key).await?;
    ensure_prompt(&viewer, PromptAction::ListVersions, Some(&prompt.access()))?;

    let rows = PromptVersionRepo::list_for_prompt(&state.pool, prompt.id).await?;
    let data = rows
        .into_iter()
        .map(|row| {
            let changed_by = row.editor();
            VersionResponse {
                id: row.version.id,
                version_number: row.version.version_number,
                content: row.version.content,
                change_description: row.version.change_description,
                changed_by,
                created_at: row.version.created_at,
            }
        })
        .collect();

    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/prompts/{id_or_slug}/restore_version
///
/// Sets the content back to a version's snapshot. The content being
/// replaced is itself recorded as a new version.
pub async fn restore_version(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
    Json(input): Json<RestoreVersionRequest>,
) -> AppResult<Json<DataResponse<PromptResponse>>> {
    let viewer = auth.viewer();
    let prompt = find_prompt(&state, &key).await?;
    ensure_prompt(&viewer, PromptAction::RestoreVersion, Some(&prompt.access()))?;

    let version = PromptVersionRepo::find_for_prompt(&state.pool, prompt.id, input.version_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "PromptVersion",
            id: input.version_id,
        })?;

    PromptRepo::restore_version(&state.pool, &version, viewer.user_id())
        .await?
        .ok_or_else(|| not_found(&key))?;

    tracing::info!(
        prompt_id = prompt.id,
        version_number = version.version_number,
        user_id = auth.user_id,
        "Prompt version restored"
    );

    let data = assemble_detail(&state, prompt.id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/prompts/{id_or_slug}/duplicate
///
/// Copies a visible prompt into a new private prompt owned by the caller.
pub async fn duplicate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
) -> AppResult<(StatusCode, Json<DataResponse<PromptResponse>>)> {
    let source = find_prompt(&state, &key).await?;
    ensure_prompt(&auth.viewer(), PromptAction::Duplicate, Some(&source.access()))?;

    let copy = PromptRepo::duplicate(&state.pool, &source, auth.user_id).await?;
    tracing::info!(
        prompt_id = copy.id,
        source_id = source.id,
        user_id = auth.user_id,
        "Prompt duplicated"
    );

    let data = assemble_detail(&state, copy.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// POST /api/v1/prompts/{id_or_slug}/increment_usage
pub async fn increment_usage(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<UsageResponse>>> {
    let prompt = find_prompt(&state, &key).await?;
    ensure_prompt(&viewer, PromptAction::IncrementUsage, Some(&prompt.access()))?;

    let usage_count = PromptRepo::increment_usage(&state.pool, prompt.id)
        .await?
        .ok_or_else(|| not_found(&key))?;

    Ok(Json(DataResponse {
        data: UsageResponse { usage_count },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(key: &str) -> AppError {
    AppError::Core(CoreError::SlugNotFound {
        entity: "Prompt",
        slug: key.to_string(),
    })
}

/// Load a prompt by numeric id, falling back to slug.
pub(crate) async fn find_prompt(state: &AppState, key: &str) -> AppResult<Prompt> {
    PromptRepo::find_by_id_or_slug(&state.pool, key)
        .await?
        .ok_or_else(|| not_found(key))
}

/// Load a prompt the viewer may change attachments on.
pub(crate) async fn find_for_attachments(
    state: &AppState,
    viewer: &Viewer,
    key: &str,
) -> AppResult<Prompt> {
    let prompt = find_prompt(state, key).await?;
    ensure_prompt(viewer, PromptAction::ManageAttachments, Some(&prompt.access()))?;
    Ok(prompt)
}

/// Parse an optional enumerated field, recording a field error when the
/// value is not one of the accepted names.
fn parse_choice<T: FromStr>(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<String>,
) -> Option<T> {
    let raw = value.as_deref()?;
    match raw.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.add(field, NOT_IN_LIST);
            None
        }
    }
}

/// Deduplicate requested tag ids and record an error for unknown ones.
async fn check_tag_ids(
    state: &AppState,
    errors: &mut FieldErrors,
    tag_ids: Option<&[DbId]>,
) -> AppResult<Option<Vec<DbId>>> {
    let Some(ids) = tag_ids else {
        return Ok(None);
    };
    let ids = dedup_ids(ids);
    let missing = TagRepo::find_missing_ids(&state.pool, &ids).await?;
    if !missing.is_empty() {
        let listed: Vec<String> = missing.iter().map(ToString::to_string).collect();
        errors.add("tag_ids", format!("contains unknown tags: {}", listed.join(", ")));
    }
    Ok(Some(ids))
}

/// Full detail view of one prompt, including version summaries.
async fn assemble_detail(state: &AppState, prompt_id: DbId) -> AppResult<PromptResponse> {
    let row = PromptRepo::find_with_owner(&state.pool, prompt_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Prompt",
            id: prompt_id,
        })?;

    let tags = TagRepo::tags_for_prompt(&state.pool, prompt_id).await?;
    let attachments = AttachmentRepo::list_for_prompt(&state.pool, prompt_id)
        .await?
        .iter()
        .map(|a| attachment_response(state, a))
        .collect();
    let versions = PromptVersionRepo::summaries_for_prompt(&state.pool, prompt_id).await?;

    let owner = row.owner();
    Ok(PromptResponse {
        prompt: row.prompt,
        owner,
        tags,
        attachments,
        versions: Some(versions),
    })
}

/// List view of many prompts. Tags and attachments are loaded in one query
/// each for the whole page.
async fn assemble_many(
    state: &AppState,
    rows: Vec<PromptWithOwner>,
) -> AppResult<Vec<PromptResponse>> {
    let ids: Vec<DbId> = rows.iter().map(|r| r.prompt.id).collect();

    let mut tags_by_prompt: HashMap<DbId, Vec<TagInfo>> = HashMap::new();
    for row in TagRepo::tags_for_prompts(&state.pool, &ids).await? {
        tags_by_prompt.entry(row.prompt_id).or_default().push(row.tag);
    }

    let mut attachments_by_prompt: HashMap<DbId, Vec<AttachmentResponse>> = HashMap::new();
    for attachment in AttachmentRepo::list_for_prompts(&state.pool, &ids).await? {
        attachments_by_prompt
            .entry(attachment.prompt_id)
            .or_default()
            .push(attachment_response(state, &attachment));
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let owner = row.owner();
            let id = row.prompt.id;
            PromptResponse {
                prompt: row.prompt,
                owner,
                tags: tags_by_prompt.remove(&id).unwrap_or_default(),
                attachments: attachments_by_prompt.remove(&id).unwrap_or_default(),
                versions: None,
            }
        })
        .collect())
}
