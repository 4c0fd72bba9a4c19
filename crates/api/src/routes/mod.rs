pub mod auth;
pub mod health;
pub mod profile;
pub mod prompts;
pub mod tags;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register, /auth/login, /auth/two-factor   sign up and sign in (public)
/// /auth/refresh                                    rotate refresh token (public)
/// /auth/logout                                     revoke sessions (requires auth)
/// /auth/two-factor/settings                        enrol, enable, disable second factor
///
/// /profile                                         own account
/// /profile/password                                change password
///
/// /users                                           list (admin only)
/// /users/{id}                                      show (self or admin)
/// /users/{id}/role                                 change role (admin only)
///
/// /prompts                                         list, create
/// /prompts/{key}                                   show, update, delete
/// /prompts/{key}/versions                          version history
/// /prompts/{key}/restore_version                   restore a version
/// /prompts/{key}/duplicate                         private copy
/// /prompts/{key}/increment_usage                   usage counter
/// /prompts/{key}/attachments                       upload files
/// /prompts/{key}/attachments/{attachment_id}       delete a file
///
/// /tags                                            list, create
/// /tags/{key}                                      show
/// ```
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/profile", profile::router())
        .nest("/users", users::router())
        .nest("/prompts", prompts::router(max_upload_bytes))
        .nest("/tags", tags::router())
}
