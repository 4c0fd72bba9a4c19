//! Repository for the `users` table.

use prompthub_core::roles::Role;
use prompthub_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUser, User};
use crate::repositories::TagRepo;

/// Column list shared across queries.
const COLUMNS: &str = "id, email, username, name, password_hash, role, \
                       otp_required_for_login, otp_secret_ciphertext, otp_secret_nonce, \
                       otp_consumed_timestep, failed_login_count, locked_until, \
                       last_login_at, created_at, updated_at";

/// Provides CRUD, sign-in bookkeeping, and second-factor state for users.
pub struct UserRepo;

impl UserRepo {
    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, username, name, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(input.username.as_deref())
            .bind(input.name.as_deref())
            .bind(&input.password_hash)
            .bind(input.role.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-insensitive) or username (exact).
    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE email = LOWER($1) OR username = $1 \
             ORDER BY (email = LOWER($1)) DESC LIMIT 1"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(login)
            .fetch_optional(pool)
            .await
    }

    /// All users, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// Apply profile edits. Only non-`None` fields are changed.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET \
                 email = COALESCE($2, email), \
                 username = COALESCE($3, username), \
                 name = COALESCE($4, name) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(input.email.as_deref())
            .bind(input.username.as_deref())
            .bind(input.name.as_deref())
            .fetch_optional(pool)
            .await
    }

    pub async fn update_role(
        pool: &PgPool,
        id: DbId,
        role: Role,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("UPDATE users SET role = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Update a user's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user and everything they own.
    ///
    /// Tag counters for the user's prompts are released first; prompts,
    /// sessions, versions, and attachment rows go through the cascades.
    /// Versions the user edited on other people's prompts keep their content
    /// with the editor reference cleared. Returns the storage keys of the
    /// removed attachments, or `None` if the user does not exist.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked = sqlx::query_scalar::<_, DbId>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let prompt_ids = sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM prompts WHERE user_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        TagRepo::release_for_prompts(&mut *tx, &prompt_ids).await?;

        let keys = sqlx::query_scalar::<_, String>(
            "SELECT storage_key FROM prompt_attachments WHERE prompt_id = ANY($1)",
        )
        .bind(&prompt_ids)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(keys))
    }

    // -----------------------------------------------------------------------
    // Sign-in bookkeeping
    // -----------------------------------------------------------------------

    /// Increment the failed login counter. Returns the new count.
    pub async fn increment_failed_login(pool: &PgPool, id: DbId) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE users SET failed_login_count = failed_login_count + 1 \
             WHERE id = $1 RETURNING failed_login_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Lock a user account until the specified timestamp.
    pub async fn lock_account(pool: &PgPool, id: DbId, until: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET locked_until = $2 WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a successful login: reset the failure counter, clear any lock,
    /// and set `last_login_at` to now.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET \
                 failed_login_count = 0, \
                 locked_until = NULL, \
                 last_login_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Second factor
    // -----------------------------------------------------------------------

    /// Store a freshly generated (encrypted) secret. Two-factor stays
    /// disabled until a code is confirmed.
    pub async fn store_otp_secret(
        pool: &PgPool,
        id: DbId,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET \
                 otp_secret_ciphertext = $2, \
                 otp_secret_nonce = $3, \
                 otp_consumed_timestep = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .bind(ciphertext)
        .bind(nonce)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn enable_two_factor(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET otp_required_for_login = true \
             WHERE id = $1 AND otp_secret_ciphertext IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Disable two-factor and forget the secret.
    pub async fn disable_two_factor(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET \
                 otp_required_for_login = false, \
                 otp_secret_ciphertext = NULL, \
                 otp_secret_nonce = NULL, \
                 otp_consumed_timestep = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark `timestep` as used. Returns `false` if it (or a later step) was
    /// already consumed, so a code cannot be accepted twice.
    pub async fn consume_otp_timestep(
        pool: &PgPool,
        id: DbId,
        timestep: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET otp_consumed_timestep = $2 \
             WHERE id = $1 \
               AND (otp_consumed_timestep IS NULL OR otp_consumed_timestep < $2)",
        )
        .bind(id)
        .bind(timestep)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
