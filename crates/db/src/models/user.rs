//! User entity model and DTOs.

use prompthub_core::roles::Role;
use prompthub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Holds the password hash and the encrypted second-factor secret. Never
/// serialize it; use [`UserResponse`] for API output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub otp_required_for_login: bool,
    pub otp_secret_ciphertext: Option<Vec<u8>>,
    pub otp_secret_nonce: Option<Vec<u8>>,
    pub otp_consumed_timestep: Option<i64>,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn is_locked(&self, now: Timestamp) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

/// Safe user representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub role: Role,
    pub two_factor_enabled: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
            two_factor_enabled: user.otp_required_for_login,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Public identity of a prompt owner or version editor.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: DbId,
    pub username: Option<String>,
    pub name: Option<String>,
}

/// DTO for creating a user. The password is already hashed.
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

/// DTO for profile edits. Only non-`None` fields are applied.
#[derive(Debug, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
}
