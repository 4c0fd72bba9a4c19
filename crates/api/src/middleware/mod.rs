//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the signed-in user from a JWT Bearer token (401 without one).
//! - [`auth::CurrentViewer`] -- the signed-in user or an anonymous viewer.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.

pub mod auth;
pub mod rbac;
