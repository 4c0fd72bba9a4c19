//! Handlers for prompt attachments (`/prompts/{id_or_slug}/attachments`).
//!
//! Bytes go to the configured [`BlobStore`](prompthub_core::storage::BlobStore);
//! the database only records the key and file metadata.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use prompthub_core::error::CoreError;
use prompthub_core::storage::{generate_storage_key, sanitize_filename, FALLBACK_FILENAME};
use prompthub_core::types::DbId;
use prompthub_core::validation::FieldErrors;
use prompthub_db::models::attachment::{CreateAttachment, PromptAttachment};
use prompthub_db::repositories::AttachmentRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::prompts::find_for_attachments;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field name carrying uploaded files. May repeat.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    pub id: DbId,
    pub filename: String,
    pub content_type: Option<String>,
    pub byte_size: i64,
    pub url: String,
}

/// POST /api/v1/prompts/{id_or_slug}/attachments
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<AttachmentResponse>>>)> {
    let prompt = find_for_attachments(&state, &auth.viewer(), &key).await?;

    let mut created = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(sanitize_filename)
            .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
        let content_type = field.content_type().map(ToString::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;

        let storage_key = generate_storage_key(&filename);
        state.blobs.put(&storage_key, &bytes).await?;

        let input = CreateAttachment {
            prompt_id: prompt.id,
            filename,
            content_type,
            byte_size: bytes.len() as i64,
            storage_key,
            uploaded_by_id: Some(auth.user_id),
        };
        let attachment = match AttachmentRepo::create(&state.pool, &input).await {
            Ok(row) => row,
            Err(e) => {
                remove_blobs(&state, &[input.storage_key]).await;
                return Err(e.into());
            }
        };
        created.push(attachment_response(&state, &attachment));
    }

    if created.is_empty() {
        let mut errors = FieldErrors::new();
        errors.add(FILE_FIELD, "can't be blank");
        return Err(AppError::Core(CoreError::InvalidFields(errors)));
    }

    tracing::info!(
        prompt_id = prompt.id,
        user_id = auth.user_id,
        count = created.len(),
        "Attachments uploaded"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// DELETE /api/v1/prompts/{id_or_slug}/attachments/{attachment_id}
pub async fn destroy(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((key, attachment_id)): Path<(String, DbId)>,
) -> AppResult<StatusCode> {
    let prompt = find_for_attachments(&state, &auth.viewer(), &key).await?;

    let removed = AttachmentRepo::delete_for_prompt(&state.pool, prompt.id, attachment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Attachment",
            id: attachment_id,
        })?;

    remove_blobs(&state, &[removed.storage_key]).await;

    tracing::info!(
        prompt_id = prompt.id,
        attachment_id,
        user_id = auth.user_id,
        "Attachment deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn attachment_response(state: &AppState, attachment: &PromptAttachment) -> AttachmentResponse {
    AttachmentResponse {
        id: attachment.id,
        filename: attachment.filename.clone(),
        content_type: attachment.content_type.clone(),
        byte_size: attachment.byte_size,
        url: state.blobs.url_for(&attachment.storage_key),
    }
}

/// Delete blobs whose rows are already gone. Failures leave an orphaned
/// file behind and are logged rather than reported to the client.
pub(crate) async fn remove_blobs(state: &AppState, keys: &[String]) {
    for key in keys {
        if let Err(e) = state.blobs.delete(key).await {
            tracing::warn!(storage_key = %key, error = %e, "Failed to remove attachment blob");
        }
    }
}
