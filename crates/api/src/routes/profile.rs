//! Route definitions for the signed-in user's own account.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::profile;
use crate::state::AppState;

/// Routes mounted at `/profile`. All require auth.
///
/// ```text
/// GET    /           -> show
/// PUT    /           -> update
/// DELETE /           -> destroy
/// PUT    /password   -> change_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(profile::show)
                .put(profile::update)
                .delete(profile::destroy),
        )
        .route("/password", put(profile::change_password))
}
