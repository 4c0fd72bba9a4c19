//! Route definitions for the `/prompts` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{attachments, prompts};
use crate::state::AppState;

/// Routes mounted at `/prompts`. `{key}` is a numeric id or a slug.
///
/// ```text
/// GET       /                                   -> list
/// POST      /                                   -> create
/// GET       /{key}                              -> show
/// PUT|PATCH /{key}                              -> update
/// DELETE    /{key}                              -> destroy
/// GET       /{key}/versions                     -> versions
/// POST      /{key}/restore_version              -> restore_version
/// POST      /{key}/duplicate                    -> duplicate
/// POST      /{key}/increment_usage              -> increment_usage
/// POST      /{key}/attachments                  -> attachments::upload
/// DELETE    /{key}/attachments/{attachment_id}  -> attachments::destroy
/// ```
///
/// Uploads are capped at `max_upload_bytes`.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(prompts::list).post(prompts::create))
        .route(
            "/{key}",
            get(prompts::show)
                .put(prompts::update)
                .patch(prompts::update)
                .delete(prompts::destroy),
        )
        .route("/{key}/versions", get(prompts::versions))
        .route("/{key}/restore_version", post(prompts::restore_version))
        .route("/{key}/duplicate", post(prompts::duplicate))
        .route("/{key}/increment_usage", post(prompts::increment_usage))
        .route(
            "/{key}/attachments",
            post(attachments::upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/{key}/attachments/{attachment_id}",
            delete(attachments::destroy),
        )
}
