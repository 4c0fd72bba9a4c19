//! Route definitions for user administration.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET /              -> list (admin only)
/// GET /{id}          -> show (self or admin)
/// PUT /{id}/role     -> change_role (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list))
        .route("/{id}", get(users::show))
        .route("/{id}/role", put(users::change_role))
}
