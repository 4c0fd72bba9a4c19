//! Handlers for the `/tags` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use prompthub_core::error::CoreError;
use prompthub_core::pagination::{clamp_limit, clamp_offset};
use prompthub_core::tags::{clean_tag_name, tag_slug, TagSort};
use prompthub_core::types::DbId;
use prompthub_core::validation::FieldErrors;
use prompthub_db::models::tag::Tag;
use prompthub_db::repositories::TagRepo;
use serde::Deserialize;

use crate::error::{unique_violation, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_TAG_LIMIT: i64 = 50;
const MAX_TAG_LIMIT: i64 = 200;
const TAKEN: &str = "has already been taken";

#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

/// GET /api/v1/tags
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListTagsQuery>,
) -> AppResult<Json<DataResponse<Vec<Tag>>>> {
    let tags = TagRepo::list(
        &state.pool,
        TagSort::from_param(params.sort.as_deref()),
        clamp_limit(params.limit, DEFAULT_TAG_LIMIT, MAX_TAG_LIMIT),
        clamp_offset(params.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: tags }))
}

/// POST /api/v1/tags
///
/// Names are unique ignoring case; the slug is derived from the name.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateTagRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Tag>>)> {
    let name = clean_tag_name(&input.name);
    let slug = tag_slug(&name).map_err(CoreError::InvalidFields)?;

    let mut errors = FieldErrors::new();
    if TagRepo::find_by_name_ci(&state.pool, &name).await?.is_some() {
        errors.add("name", TAKEN);
    } else if TagRepo::find_by_slug(&state.pool, &slug).await?.is_some() {
        errors.add("slug", TAKEN);
    }
    errors.into_result()?;

    // The unique indexes still decide a race between two creates.
    let tag = TagRepo::create(&state.pool, &name, &slug)
        .await
        .map_err(|e| {
            let field = match unique_violation(&e) {
                Some("uq_tags_name_lower") => "name",
                Some("uq_tags_slug") => "slug",
                _ => return AppError::Database(e),
            };
            let mut errors = FieldErrors::new();
            errors.add(field, TAKEN);
            AppError::Core(CoreError::InvalidFields(errors))
        })?;

    tracing::info!(tag_id = tag.id, slug = %tag.slug, user_id = auth.user_id, "Tag created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: tag })))
}

/// GET /api/v1/tags/{id_or_slug}
pub async fn show(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<Tag>>> {
    let by_id = match key.parse::<DbId>() {
        Ok(id) => TagRepo::find_by_id(&state.pool, id).await?,
        Err(_) => None,
    };
    let tag = match by_id {
        Some(tag) => tag,
        None => TagRepo::find_by_slug(&state.pool, &key)
            .await?
            .ok_or_else(|| CoreError::SlugNotFound {
                entity: "Tag",
                slug: key.clone(),
            })?,
    };
    Ok(Json(DataResponse { data: tag }))
}
