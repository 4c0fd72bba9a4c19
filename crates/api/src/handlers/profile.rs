//! Handlers for the signed-in user's own account (`/profile`).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use prompthub_core::error::CoreError;
use prompthub_core::validation::{self, FieldErrors};
use prompthub_db::models::user::{UpdateUser, User, UserResponse};
use prompthub_db::repositories::{SessionRepo, UserRepo};
use serde::Deserialize;
use validator::Validate;

use crate::auth::password::{check_new_password, hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::handlers::attachments::remove_blobs;
use crate::handlers::auth::taken_fields;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "is invalid"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub username: Option<String>,
    #[validate(length(max = 100, message = "is too long (maximum is 100 characters)"))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub password: String,
    pub password_confirmation: Option<String>,
}

/// GET /api/v1/profile
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = load_user(&state, &auth).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// PUT /api/v1/profile
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input.username = input.username.map(|u| u.trim().to_string());
    validation::check(&input).into_result()?;

    let changes = UpdateUser {
        email: input.email.map(|e| e.trim().to_lowercase()),
        username: input.username,
        name: input.name,
    };

    let user = UserRepo::update(&state.pool, auth.user_id, &changes)
        .await
        .map_err(taken_fields)?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    tracing::info!(user_id = user.id, "Profile updated");

    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// PUT /api/v1/profile/password
///
/// Requires the current password. Every session is revoked afterwards, so
/// the client must sign in again.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    let user = load_user(&state, &auth).await?;

    let mut errors = FieldErrors::new();
    let current_ok = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_ok {
        errors.add("current_password", "is invalid");
    }
    check_new_password(
        &mut errors,
        &input.password,
        Some(input.password_confirmation.as_deref().unwrap_or_default()),
        state.config.min_password_length,
    );
    errors.into_result()?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, user.id, &password_hash).await?;
    SessionRepo::revoke_all_for_user(&state.pool, user.id).await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/profile
///
/// Deletes the account and everything it owns, then removes the stored
/// attachment files.
pub async fn destroy(State(state): State<AppState>, auth: AuthUser) -> AppResult<StatusCode> {
    let keys = UserRepo::delete(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    remove_blobs(&state, &keys).await;

    tracing::info!(user_id = auth.user_id, attachments = keys.len(), "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load_user(state: &AppState, auth: &AuthUser) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))
}
