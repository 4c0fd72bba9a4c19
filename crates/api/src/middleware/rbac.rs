//! Route-level role gates.
//!
//! Rules that depend on the resource (ownership, visibility) live in
//! [`prompthub_core::policy`]. The extractors here cover routes where the
//! caller's role alone decides.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use prompthub_core::error::CoreError;
use prompthub_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// An authenticated caller holding the `admin` role. Anyone else gets 403.
///
/// ```ignore
/// async fn list(RequireAdmin(admin): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        match user.role {
            Role::Admin => Ok(Self(user)),
            Role::User => Err(CoreError::Forbidden("Admin role required".into()).into()),
        }
    }
}
