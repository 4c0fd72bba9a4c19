//! Handlers for user administration (`/users`).

use axum::extract::{Path, State};
use axum::Json;
use prompthub_core::error::CoreError;
use prompthub_core::policy::{ensure_user, UserAction};
use prompthub_core::roles::Role;
use prompthub_core::types::DbId;
use prompthub_db::models::user::UserResponse;
use prompthub_db::repositories::UserRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(DataResponse {
        data: users.iter().map(UserResponse::from).collect(),
    }))
}

/// GET /api/v1/users/{id}
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    ensure_user(&auth.viewer(), UserAction::Show, Some(id))?;

    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;

    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// PUT /api/v1/users/{id}/role
///
/// Promote a user to admin or demote them.
pub async fn change_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<ChangeRoleRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    ensure_user(&auth.viewer(), UserAction::ChangeRole, Some(id))?;

    let role: Role = input.role.parse().map_err(AppError::Core)?;

    let user = UserRepo::update_role(&state.pool, id, role)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;

    tracing::info!(user_id = id, role = %role, admin_id = auth.user_id, "User role changed");

    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}
