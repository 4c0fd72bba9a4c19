//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{auth, two_factor};
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /register              -> register
/// POST   /login                 -> login
/// POST   /two-factor            -> verify_two_factor
/// POST   /refresh               -> refresh
/// POST   /logout                -> logout (requires auth)
/// GET    /two-factor/settings   -> two_factor::show (requires auth)
/// POST   /two-factor/settings   -> two_factor::enable (requires auth)
/// DELETE /two-factor/settings   -> two_factor::disable (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/two-factor", post(auth::verify_two_factor))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route(
            "/two-factor/settings",
            get(two_factor::show)
                .post(two_factor::enable)
                .delete(two_factor::disable),
        )
}
